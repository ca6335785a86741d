//! VWAP Reversal: reacts to newly completed 15-minute candles around the running
//! VWAP, inside a configurable mid-session window (§4.2).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;

use crate::application::market_data::MarketDataStore;
use crate::config::VwapReversalConfig;
use crate::domain::market::phase::StrategyPhase;
use crate::domain::signal::{CandidateFeatures, CandidateSignal, Direction, SetupKind, StrategyName};

use super::traits::{Strategy, StrategyInputs};

const ACTIVE_PHASES: &[StrategyPhase] = &[StrategyPhase::Continuous];

pub struct VwapReversalStrategy {
    config: VwapReversalConfig,
    last_seen_bucket: HashMap<String, DateTime<Utc>>,
    signal_count: HashMap<String, u32>,
    last_signal_at: HashMap<String, DateTime<Utc>>,
}

impl VwapReversalStrategy {
    pub fn new(config: VwapReversalConfig) -> Self {
        Self {
            config,
            last_seen_bucket: HashMap::new(),
            signal_count: HashMap::new(),
            last_signal_at: HashMap::new(),
        }
    }

    fn within_window(&self, t: NaiveTime) -> bool {
        let start = NaiveTime::from_hms_opt(
            self.config.window_start_hour,
            self.config.window_start_minute,
            0,
        )
        .expect("valid VWAP window start");
        let end =
            NaiveTime::from_hms_opt(self.config.window_end_hour, self.config.window_end_minute, 0)
                .expect("valid VWAP window end");
        t >= start && t < end
    }

    fn under_cooldown(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        if self.signal_count.get(symbol).copied().unwrap_or(0) >= self.config.max_signals_per_day {
            return true;
        }
        if let Some(last) = self.last_signal_at.get(symbol) {
            let elapsed = now.signed_duration_since(*last).num_minutes();
            if elapsed < self.config.min_inter_signal_minutes {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Strategy for VwapReversalStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::VwapReversal
    }

    fn active_phases(&self) -> &'static [StrategyPhase] {
        ACTIVE_PHASES
    }

    async fn evaluate(
        &mut self,
        store: &MarketDataStore,
        inputs: &StrategyInputs<'_>,
    ) -> Vec<CandidateSignal> {
        if !self.within_window(inputs.now.time()) {
            return Vec::new();
        }

        let mut signals = Vec::new();
        for symbol in inputs.symbols {
            let completed = store.get_completed_candles(symbol).await;
            if completed.len() < 2 {
                continue;
            }
            let current = completed[completed.len() - 1];
            if self.last_seen_bucket.get(symbol) == Some(&current.bucket_start) {
                continue;
            }
            self.last_seen_bucket
                .insert(symbol.clone(), current.bucket_start);

            if self.under_cooldown(symbol, inputs.now) {
                continue;
            }

            let Some(vwap) = store.get_vwap(symbol).await else {
                continue;
            };
            let prior = completed[completed.len() - 2];
            let avg_candle_volume = store.get_avg_candle_volume(symbol).await;
            if avg_candle_volume == 0 {
                continue;
            }
            let current_volume = Decimal::from(current.volume);

            let (setup, stop_loss) = if prior.close > vwap
                && (current.low - vwap) / vwap * Decimal::from(100) <= self.config.touch_threshold_pct
                && current.close > vwap
                && current_volume >= Decimal::from(avg_candle_volume) * self.config.pullback_volume_mult
            {
                let sl = vwap * (Decimal::ONE - self.config.setup1_sl_below_vwap_pct / Decimal::from(100));
                (Some(SetupKind::VwapUptrendPullback), sl)
            } else if prior.close < vwap
                && current.close > vwap
                && current_volume >= Decimal::from(avg_candle_volume) * self.config.reclaim_volume_mult
            {
                let lookback = &completed[completed.len().saturating_sub(3)..];
                let sl = lookback
                    .iter()
                    .map(|c| c.low)
                    .fold(lookback[0].low, |acc, low| acc.min(low));
                (Some(SetupKind::VwapReclaim), sl)
            } else {
                (None, Decimal::ZERO)
            };

            let Some(setup) = setup else { continue };

            let entry = store
                .get_tick(symbol)
                .await
                .map(|t| t.ltp)
                .unwrap_or(current.close);
            let target1 = entry * (Decimal::ONE + self.config.t1_pct / Decimal::from(100));
            let target2 = entry * (Decimal::ONE + self.config.t2_pct / Decimal::from(100));

            signals.push(CandidateSignal {
                symbol: symbol.clone(),
                direction: Direction::Buy,
                strategy: StrategyName::VwapReversal,
                setup: Some(setup),
                entry,
                stop_loss,
                target1,
                target2,
                features: CandidateFeatures {
                    gap_pct: None,
                    volume_ratio_pct: Some(
                        current_volume / Decimal::from(avg_candle_volume) * Decimal::from(100),
                    ),
                    distance_from_open_pct: None,
                },
                generated_at: inputs.now,
            });

            *self.signal_count.entry(symbol.clone()).or_insert(0) += 1;
            self.last_signal_at.insert(symbol.clone(), inputs.now);
        }
        signals
    }

    fn reset(&mut self) {
        self.last_seen_bucket.clear();
        self.signal_count.clear();
        self.last_signal_at.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Tick;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn config() -> VwapReversalConfig {
        VwapReversalConfig {
            window_start_hour: 10,
            window_start_minute: 0,
            window_end_hour: 14,
            window_end_minute: 30,
            touch_threshold_pct: dec!(0.3),
            pullback_volume_mult: dec!(1.2),
            reclaim_volume_mult: dec!(1.8),
            setup1_sl_below_vwap_pct: dec!(0.5),
            t1_pct: dec!(1.0),
            t2_pct: dec!(2.0),
            max_signals_per_day: 3,
            min_inter_signal_minutes: 15,
        }
    }

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn uptrend_pullback_emits_once_per_completed_candle() {
        let store = MarketDataStore::new();
        store.update_vwap("SBIN", dec!(100), dec!(1000)).await;
        store.update_candle("SBIN", dec!(101), 1000, ts(10, 1)).await;
        store.update_candle("SBIN", dec!(100.2), 5000, ts(10, 16)).await;
        store.update_candle("SBIN", dec!(101), 1, ts(10, 31)).await;
        store
            .update_tick(
                "SBIN",
                Tick::new(dec!(101), dec!(100), dec!(101), dec!(100), dec!(100), 1000, ts(10, 16)),
            )
            .await;

        let mut strategy = VwapReversalStrategy::new(config());
        let symbols = vec!["SBIN".to_string()];
        let excluded = Default::default();
        let signals = strategy
            .evaluate(
                &store,
                &StrategyInputs {
                    symbols: &symbols,
                    phase: StrategyPhase::Continuous,
                    now: ts(10, 31),
                    gap_flagged_symbols: &excluded,
                },
            )
            .await;
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].setup, Some(SetupKind::VwapUptrendPullback));

        let again = strategy
            .evaluate(
                &store,
                &StrategyInputs {
                    symbols: &symbols,
                    phase: StrategyPhase::Continuous,
                    now: ts(10, 32),
                    gap_flagged_symbols: &excluded,
                },
            )
            .await;
        assert!(again.is_empty(), "same completed candle is idempotent");
    }

    #[tokio::test]
    async fn outside_window_never_signals() {
        let store = MarketDataStore::new();
        store.update_vwap("SBIN", dec!(100), dec!(1000)).await;
        store.update_candle("SBIN", dec!(101), 4000, ts(9, 1)).await;
        store.update_candle("SBIN", dec!(100.2), 5000, ts(9, 16)).await;
        store.update_candle("SBIN", dec!(101), 1, ts(9, 31)).await;

        let mut strategy = VwapReversalStrategy::new(config());
        let symbols = vec!["SBIN".to_string()];
        let excluded = Default::default();
        let signals = strategy
            .evaluate(
                &store,
                &StrategyInputs {
                    symbols: &symbols,
                    phase: StrategyPhase::Continuous,
                    now: ts(9, 31),
                    gap_flagged_symbols: &excluded,
                },
            )
            .await;
        assert!(signals.is_empty());
    }
}
