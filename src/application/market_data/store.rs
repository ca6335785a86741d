//! The process-wide, async-safe market data store (§4.1).
//!
//! A single mutex guards every mutator and accessor. Every public operation
//! suspends only on mutex acquisition; no I/O happens inside the critical section,
//! matching §5's "no awaits inside the critical section" rule. All operations are
//! infallible against their inputs — unknown symbols return absent/zero, they never
//! error.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::domain::market::candle::bucket_start;
use crate::domain::market::{Candle15m, HistoricalReference, OpeningRange, Tick, VwapState};

#[derive(Default)]
struct SymbolState {
    tick: Option<Tick>,
    historical: Option<HistoricalReference>,
    opening_range: OpeningRange,
    vwap: VwapState,
    current_candle: Option<Candle15m>,
    completed_candles: Vec<Candle15m>,
}

#[derive(Default)]
struct Inner {
    symbols: HashMap<String, SymbolState>,
}

pub struct MarketDataStore {
    inner: Mutex<Inner>,
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Replaces the tick for `symbol`.
    pub async fn update_tick(&self, symbol: &str, tick: Tick) {
        let mut inner = self.inner.lock().await;
        inner.symbols.entry(symbol.to_string()).or_default().tick = Some(tick);
    }

    pub async fn get_tick(&self, symbol: &str) -> Option<Tick> {
        let inner = self.inner.lock().await;
        inner.symbols.get(symbol).and_then(|s| s.tick)
    }

    /// Symbols that currently carry a tick, i.e. have been subscribed and received
    /// at least one update this session.
    pub async fn symbols_with_ticks(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .symbols
            .iter()
            .filter(|(_, s)| s.tick.is_some())
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    /// Sets the historical reference once at startup. Idempotent — later calls
    /// silently overwrite, matching the reference loader's re-run-safe contract.
    pub async fn set_historical(&self, symbol: &str, reference: HistoricalReference) {
        let mut inner = self.inner.lock().await;
        inner.symbols.entry(symbol.to_string()).or_default().historical = Some(reference);
    }

    pub async fn get_historical(&self, symbol: &str) -> Option<HistoricalReference> {
        let inner = self.inner.lock().await;
        inner.symbols.get(symbol).and_then(|s| s.historical)
    }

    /// Replaces the cumulative day volume tracked on the tick (the broker supplies a
    /// running total, never a delta).
    pub async fn accumulate_volume(&self, symbol: &str, cumulative: i64) {
        let mut inner = self.inner.lock().await;
        if let Some(state) = inner.symbols.get_mut(symbol)
            && let Some(tick) = state.tick.as_mut()
        {
            tick.cum_volume = cumulative;
        }
    }

    /// Widens the opening range; no-op once locked.
    pub async fn update_opening_range(&self, symbol: &str, high: Decimal, low: Decimal) {
        let mut inner = self.inner.lock().await;
        inner
            .symbols
            .entry(symbol.to_string())
            .or_default()
            .opening_range
            .widen(high, low);
    }

    pub async fn get_opening_range(&self, symbol: &str) -> Option<OpeningRange> {
        let inner = self.inner.lock().await;
        inner.symbols.get(symbol).map(|s| s.opening_range)
    }

    /// For every tracked symbol with `low > 0`, locks the range and computes
    /// `range_size_pct`.
    pub async fn lock_opening_ranges(&self) {
        let mut inner = self.inner.lock().await;
        for state in inner.symbols.values_mut() {
            state.opening_range.lock();
        }
    }

    pub async fn update_vwap(&self, symbol: &str, price: Decimal, delta_volume: Decimal) {
        let mut inner = self.inner.lock().await;
        inner
            .symbols
            .entry(symbol.to_string())
            .or_default()
            .vwap
            .accumulate(price, delta_volume);
    }

    pub async fn get_vwap(&self, symbol: &str) -> Option<Decimal> {
        let inner = self.inner.lock().await;
        inner.symbols.get(symbol).and_then(|s| s.vwap.current())
    }

    /// Finalizes the previous candle into the completed sequence and opens a fresh
    /// one whenever the 15-minute bucket changes; otherwise widens the current one.
    pub async fn update_candle(
        &self,
        symbol: &str,
        price: Decimal,
        delta_volume: i64,
        timestamp: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().await;
        let state = inner.symbols.entry(symbol.to_string()).or_default();
        let bucket = bucket_start(timestamp);

        match state.current_candle {
            Some(current) if current.bucket_start == bucket => {
                state
                    .current_candle
                    .as_mut()
                    .expect("checked Some above")
                    .apply(price, delta_volume);
            }
            Some(current) => {
                state.completed_candles.push(current);
                state.current_candle = Some(Candle15m::open_at(timestamp, price, delta_volume));
            }
            None => {
                state.current_candle = Some(Candle15m::open_at(timestamp, price, delta_volume));
            }
        }
    }

    pub async fn get_current_candle(&self, symbol: &str) -> Option<Candle15m> {
        let inner = self.inner.lock().await;
        inner.symbols.get(symbol).and_then(|s| s.current_candle)
    }

    pub async fn get_completed_candles(&self, symbol: &str) -> Vec<Candle15m> {
        let inner = self.inner.lock().await;
        inner
            .symbols
            .get(symbol)
            .map(|s| s.completed_candles.clone())
            .unwrap_or_default()
    }

    /// Mean volume of completed candles only; `0` if none.
    pub async fn get_avg_candle_volume(&self, symbol: &str) -> i64 {
        let inner = self.inner.lock().await;
        match inner.symbols.get(symbol) {
            Some(state) if !state.completed_candles.is_empty() => {
                let total: i64 = state.completed_candles.iter().map(|c| c.volume).sum();
                total / state.completed_candles.len() as i64
            }
            _ => 0,
        }
    }

    /// Resets everything except historical references. Called at session start, not
    /// on crash recovery.
    pub async fn clear_session(&self) {
        let mut inner = self.inner.lock().await;
        for state in inner.symbols.values_mut() {
            let historical = state.historical.take();
            *state = SymbolState::default();
            state.historical = historical;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn update_tick_then_get_tick_round_trips() {
        let store = MarketDataStore::new();
        let tick = Tick::new(
            dec!(100.5),
            dec!(100),
            dec!(101),
            dec!(99),
            dec!(98),
            5000,
            ts(9, 20),
        );
        store.update_tick("SBIN", tick).await;
        assert_eq!(store.get_tick("SBIN").await, Some(tick));
    }

    #[tokio::test]
    async fn unknown_symbol_returns_absent() {
        let store = MarketDataStore::new();
        assert_eq!(store.get_tick("UNKNOWN").await, None);
        assert_eq!(store.get_avg_candle_volume("UNKNOWN").await, 0);
    }

    #[tokio::test]
    async fn opening_range_locks_and_ignores_further_updates() {
        let store = MarketDataStore::new();
        store.update_opening_range("SBIN", dec!(105), dec!(100)).await;
        store.lock_opening_ranges().await;
        let locked = store.get_opening_range("SBIN").await.unwrap();
        assert!(locked.locked);

        store.update_opening_range("SBIN", dec!(200), dec!(1)).await;
        let after = store.get_opening_range("SBIN").await.unwrap();
        assert_eq!(after.high, locked.high);
        assert_eq!(after.low, locked.low);
    }

    #[tokio::test]
    async fn identical_opening_range_updates_are_idempotent() {
        let store = MarketDataStore::new();
        store.update_opening_range("SBIN", dec!(105), dec!(100)).await;
        let once = store.get_opening_range("SBIN").await.unwrap();
        store.update_opening_range("SBIN", dec!(105), dec!(100)).await;
        let twice = store.get_opening_range("SBIN").await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn candle_bucket_change_finalizes_previous_candle() {
        let store = MarketDataStore::new();
        store.update_candle("SBIN", dec!(100), 100, ts(9, 16)).await;
        store.update_candle("SBIN", dec!(101), 50, ts(9, 20)).await;
        store.update_candle("SBIN", dec!(102), 200, ts(9, 31)).await;

        let completed = store.get_completed_candles("SBIN").await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].bucket_start, ts(9, 15));
        assert_eq!(completed[0].close, dec!(101));
        assert_eq!(completed[0].volume, 150);

        let current = store.get_current_candle("SBIN").await.unwrap();
        assert_eq!(current.bucket_start, ts(9, 30));
        assert!(current.bucket_start > completed[0].bucket_start);
    }

    #[tokio::test]
    async fn avg_candle_volume_excludes_current_candle() {
        let store = MarketDataStore::new();
        store.update_candle("SBIN", dec!(100), 100, ts(9, 16)).await;
        store.update_candle("SBIN", dec!(101), 200, ts(9, 31)).await;
        assert_eq!(store.get_avg_candle_volume("SBIN").await, 100);
    }

    #[tokio::test]
    async fn clear_session_preserves_historical_but_clears_ticks() {
        let store = MarketDataStore::new();
        store
            .set_historical(
                "SBIN",
                HistoricalReference {
                    prev_close: dec!(100),
                    prev_high: dec!(102),
                    avg_daily_volume: dec!(10000),
                },
            )
            .await;
        store
            .update_tick(
                "SBIN",
                Tick::new(dec!(101), dec!(100), dec!(102), dec!(99), dec!(98), 500, ts(9, 16)),
            )
            .await;

        store.clear_session().await;

        assert_eq!(store.get_tick("SBIN").await, None);
        assert!(store.get_historical("SBIN").await.is_some());
    }

    #[tokio::test]
    async fn vwap_is_undefined_until_volume_is_nonzero() {
        let store = MarketDataStore::new();
        assert_eq!(store.get_vwap("SBIN").await, None);
        store.update_vwap("SBIN", dec!(100), dec!(10)).await;
        assert_eq!(store.get_vwap("SBIN").await, Some(dec!(100)));
    }
}
