//! Per-trade trailing-stop state machine: trailing/breakeven updates, SL/T1/T2
//! checks, proximity advisories, and the 15:00/15:15 time-based exits (§4.11).

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::application::market_data::MarketDataStore;
use crate::config::TrailingConfig;
use crate::domain::trade::{ClosedTrade, ExitReason, Trade, TrailingStopState};

#[derive(Debug, Clone)]
pub enum ExitAlert {
    TrailingSlUpdate { symbol: String, new_sl: Decimal },
    Breakeven { symbol: String },
    Exit { symbol: String, reason: ExitReason, price: Decimal },
    T1Reached { trade_id: i64, symbol: String, price: Decimal },
    SlApproaching { trade_id: i64, symbol: String, ltp: Decimal, sl: Decimal },
    NearT2 { trade_id: i64, symbol: String, ltp: Decimal, target2: Decimal },
    TimeExitWarning { symbol: String, unrealized_pnl_pct: Decimal },
}

pub struct ExitMonitor {
    config: TrailingConfig,
    states: HashMap<i64, TrailingStopState>,
}

impl ExitMonitor {
    pub fn new(config: TrailingConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn track(&mut self, trade: &Trade) {
        self.states
            .entry(trade.id)
            .or_insert_with(|| TrailingStopState::new(trade.entry_price, trade.stop_loss));
    }

    pub fn stop_tracking(&mut self, trade_id: i64) {
        self.states.remove(&trade_id);
    }

    /// Evaluates every open trade against its latest tick, returning the closed
    /// trades (caller persists via `TradeRepository::close_trade`) and alerts.
    pub async fn evaluate(
        &mut self,
        trades: &[Trade],
        store: &MarketDataStore,
        now: DateTime<Utc>,
    ) -> (Vec<(i64, ClosedTrade)>, Vec<ExitAlert>) {
        let mut closed = Vec::new();
        let mut alerts = Vec::new();

        for trade in trades {
            if !trade.is_open() {
                continue;
            }
            let Some(tick) = store.get_tick(&trade.symbol).await else {
                continue;
            };
            let ltp = tick.ltp;
            self.track(trade);
            let state = self.states.get_mut(&trade.id).expect("tracked above");

            state.highest_price = state.highest_price.max(ltp);
            let gain_pct = (ltp - trade.entry_price) / trade.entry_price * Decimal::from(100);

            if gain_pct >= self.config.trail_trigger_pct {
                let new_sl = ltp * (Decimal::ONE - self.config.trail_distance_pct / Decimal::from(100));
                if new_sl > state.current_sl {
                    state.current_sl = new_sl;
                    state.trailing_active = true;
                    state.breakeven_triggered = true;
                    alerts.push(ExitAlert::TrailingSlUpdate {
                        symbol: trade.symbol.clone(),
                        new_sl,
                    });
                }
            } else if gain_pct >= self.config.breakeven_trigger_pct && !state.breakeven_triggered {
                state.current_sl = trade.entry_price;
                state.breakeven_triggered = true;
                alerts.push(ExitAlert::Breakeven {
                    symbol: trade.symbol.clone(),
                });
            }

            if ltp <= state.current_sl {
                let reason = if state.trailing_active {
                    ExitReason::TrailingSl
                } else {
                    ExitReason::SlHit
                };
                closed.push((
                    trade.id,
                    ClosedTrade {
                        exit_price: ltp,
                        exit_reason: reason,
                        realized_pnl_abs: trade.pnl_abs(ltp),
                        realized_pnl_pct: trade.pnl_pct(ltp),
                        exit_at: now,
                    },
                ));
                alerts.push(ExitAlert::Exit {
                    symbol: trade.symbol.clone(),
                    reason,
                    price: ltp,
                });
                self.stop_tracking(trade.id);
                continue;
            }

            if ltp >= trade.target2 {
                closed.push((
                    trade.id,
                    ClosedTrade {
                        exit_price: ltp,
                        exit_reason: ExitReason::T2Hit,
                        realized_pnl_abs: trade.pnl_abs(ltp),
                        realized_pnl_pct: trade.pnl_pct(ltp),
                        exit_at: now,
                    },
                ));
                alerts.push(ExitAlert::Exit {
                    symbol: trade.symbol.clone(),
                    reason: ExitReason::T2Hit,
                    price: ltp,
                });
                self.stop_tracking(trade.id);
                continue;
            }

            if ltp >= trade.target1 && !state.t1_alerted {
                state.t1_alerted = true;
                alerts.push(ExitAlert::T1Reached {
                    trade_id: trade.id,
                    symbol: trade.symbol.clone(),
                    price: ltp,
                });
            }

            if !state.current_sl.is_zero() {
                let proximity_pct = (ltp - state.current_sl).abs() / state.current_sl * Decimal::from(100);
                let cooled_down = state
                    .sl_approaching_cooldown_until
                    .map(|until| now > until)
                    .unwrap_or(true);
                if proximity_pct <= self.config.sl_proximity_pct && cooled_down {
                    alerts.push(ExitAlert::SlApproaching {
                        trade_id: trade.id,
                        symbol: trade.symbol.clone(),
                        ltp,
                        sl: state.current_sl,
                    });
                    state.sl_approaching_cooldown_until =
                        Some(now + chrono::Duration::seconds(self.config.sl_proximity_cooldown_secs));
                }
            }

            if state.t1_alerted && !state.near_t2_alerted {
                let near_t2_pct = (ltp - trade.target2).abs() / trade.target2 * Decimal::from(100);
                if near_t2_pct <= self.config.near_t2_pct {
                    state.near_t2_alerted = true;
                    alerts.push(ExitAlert::NearT2 {
                        trade_id: trade.id,
                        symbol: trade.symbol.clone(),
                        ltp,
                        target2: trade.target2,
                    });
                }
            }
        }

        (closed, alerts)
    }

    /// At 15:00 IST, advisory-only; at 15:15 IST, force-closes every open trade
    /// with `time_exit`. `mandatory` selects which behavior runs.
    pub async fn trigger_time_exit(
        &mut self,
        trades: &[Trade],
        store: &MarketDataStore,
        now: DateTime<Utc>,
        mandatory: bool,
    ) -> (Vec<(i64, ClosedTrade)>, Vec<ExitAlert>) {
        let mut closed = Vec::new();
        let mut alerts = Vec::new();
        for trade in trades {
            if !trade.is_open() {
                continue;
            }
            let Some(tick) = store.get_tick(&trade.symbol).await else {
                continue;
            };
            if mandatory {
                closed.push((
                    trade.id,
                    ClosedTrade {
                        exit_price: tick.ltp,
                        exit_reason: ExitReason::TimeExit,
                        realized_pnl_abs: trade.pnl_abs(tick.ltp),
                        realized_pnl_pct: trade.pnl_pct(tick.ltp),
                        exit_at: now,
                    },
                ));
                self.stop_tracking(trade.id);
            } else {
                alerts.push(ExitAlert::TimeExitWarning {
                    symbol: trade.symbol.clone(),
                    unrealized_pnl_pct: trade.pnl_pct(tick.ltp),
                });
            }
        }
        (closed, alerts)
    }

    pub fn is_advisory_cutoff(t: NaiveTime) -> bool {
        t >= NaiveTime::from_hms_opt(15, 0, 0).expect("valid time")
    }

    pub fn is_mandatory_cutoff(t: NaiveTime) -> bool {
        t >= NaiveTime::from_hms_opt(15, 15, 0).expect("valid time")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Tick;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn config() -> TrailingConfig {
        TrailingConfig {
            trail_trigger_pct: dec!(1.5),
            trail_distance_pct: dec!(0.5),
            breakeven_trigger_pct: dec!(0.5),
            sl_proximity_pct: dec!(0.5),
            sl_proximity_cooldown_secs: 60,
            near_t2_pct: dec!(0.3),
        }
    }

    fn trade(id: i64, entry: Decimal, sl: Decimal, t1: Decimal, t2: Decimal) -> Trade {
        Trade {
            id,
            signal_id: 1,
            symbol: "SBIN".to_string(),
            entry_price: entry,
            stop_loss: sl,
            target1: t1,
            target2: t2,
            quantity: 100,
            taken_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap(),
            closed: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    async fn store_with_ltp(ltp: Decimal) -> MarketDataStore {
        let store = MarketDataStore::new();
        store
            .update_tick(
                "SBIN",
                Tick::new(ltp, dec!(100), ltp, dec!(99), ltp, 1000, now()),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn breakeven_then_sl_hit_closes_as_sl_hit() {
        let mut monitor = ExitMonitor::new(config());
        let t = trade(1, dec!(100), dec!(98), dec!(103), dec!(106));
        let store = store_with_ltp(dec!(100.6)).await;
        let (closed, alerts) = monitor.evaluate(&[t.clone()], &store, now()).await;
        assert!(closed.is_empty());
        assert!(matches!(alerts[0], ExitAlert::Breakeven { .. }));

        let store = store_with_ltp(dec!(100)).await;
        let (closed, alerts) = monitor.evaluate(&[t], &store, now()).await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].1.exit_reason, ExitReason::SlHit);
        assert!(alerts
            .iter()
            .any(|a| matches!(a, ExitAlert::Exit { reason: ExitReason::SlHit, .. })));
    }

    #[tokio::test]
    async fn trailing_promotes_sl_above_breakeven() {
        let mut monitor = ExitMonitor::new(config());
        let t = trade(1, dec!(100), dec!(98), dec!(103), dec!(110));
        let store = store_with_ltp(dec!(102)).await;
        let (_, alerts) = monitor.evaluate(&[t.clone()], &store, now()).await;
        assert!(matches!(alerts[0], ExitAlert::TrailingSlUpdate { .. }));

        let store = store_with_ltp(dec!(101.4)).await;
        let (closed, _) = monitor.evaluate(&[t], &store, now()).await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].1.exit_reason, ExitReason::TrailingSl);
    }

    #[tokio::test]
    async fn t2_hit_closes_with_t2_reason() {
        let mut monitor = ExitMonitor::new(config());
        let t = trade(1, dec!(100), dec!(98), dec!(103), dec!(106));
        let store = store_with_ltp(dec!(106.5)).await;
        let (closed, alerts) = monitor.evaluate(&[t], &store, now()).await;
        assert_eq!(closed[0].1.exit_reason, ExitReason::T2Hit);
        assert!(alerts
            .iter()
            .any(|a| matches!(a, ExitAlert::Exit { reason: ExitReason::T2Hit, .. })));
    }

    #[tokio::test]
    async fn mandatory_time_exit_closes_all_open_trades() {
        let mut monitor = ExitMonitor::new(config());
        let t = trade(1, dec!(100), dec!(98), dec!(103), dec!(110));
        let store = store_with_ltp(dec!(101)).await;
        let (closed, _) = monitor
            .trigger_time_exit(&[t], &store, now(), true)
            .await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].1.exit_reason, ExitReason::TimeExit);
    }
}
