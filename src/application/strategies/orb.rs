//! Opening Range Breakout: trades a locked opening range's high once price, volume,
//! and risk all clear their bars, before a configurable end-of-window time (§4.2).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;

use crate::application::market_data::MarketDataStore;
use crate::config::OrbConfig;
use crate::domain::market::phase::StrategyPhase;
use crate::domain::signal::{CandidateFeatures, CandidateSignal, Direction, SetupKind, StrategyName};

use super::traits::{Strategy, StrategyInputs};

const ACTIVE_PHASES: &[StrategyPhase] = &[StrategyPhase::Continuous];

pub struct OrbStrategy {
    config: OrbConfig,
    signaled: HashSet<String>,
}

impl OrbStrategy {
    pub fn new(config: OrbConfig) -> Self {
        Self {
            config,
            signaled: HashSet::new(),
        }
    }

    fn within_window(&self, t: NaiveTime) -> bool {
        let cutoff = NaiveTime::from_hms_opt(self.config.window_end_hour, self.config.window_end_minute, 0)
            .expect("valid ORB window end");
        t < cutoff
    }
}

#[async_trait]
impl Strategy for OrbStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::OpeningRangeBreakout
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
            if self.signaled.contains(symbol) || inputs.gap_flagged_symbols.contains(symbol) {
                continue;
            }

            let Some(range) = store.get_opening_range(symbol).await else {
                continue;
            };
            if !range.locked {
                continue;
            }
            let Some(range_size_pct) = range.range_size_pct else {
                continue;
            };
            if range_size_pct < self.config.range_size_min_pct
                || range_size_pct > self.config.range_size_max_pct
            {
                continue;
            }

            let Some(tick) = store.get_tick(symbol).await else {
                continue;
            };
            if tick.ltp <= range.high {
                continue;
            }

            let Some(current_candle) = store.get_current_candle(symbol).await else {
                continue;
            };
            let avg_candle_volume = store.get_avg_candle_volume(symbol).await;
            if avg_candle_volume == 0 {
                continue;
            }
            let volume_bar = Decimal::from(avg_candle_volume) * self.config.volume_multiplier;
            if Decimal::from(current_candle.volume) < volume_bar {
                continue;
            }

            let entry = tick.ltp;
            let risk_pct = (entry - range.low) / entry * Decimal::from(100);
            if risk_pct > self.config.max_risk_pct {
                continue;
            }

            let stop_loss = range.low;
            let target1 = entry * (Decimal::ONE + self.config.t1_pct / Decimal::from(100));
            let target2 = entry * (Decimal::ONE + self.config.t2_pct / Decimal::from(100));

            signals.push(CandidateSignal {
                symbol: symbol.clone(),
                direction: Direction::Buy,
                strategy: StrategyName::OpeningRangeBreakout,
                setup: Some(SetupKind::OrbBreakout),
                entry,
                stop_loss,
                target1,
                target2,
                features: CandidateFeatures {
                    gap_pct: None,
                    volume_ratio_pct: Some(
                        Decimal::from(current_candle.volume) / Decimal::from(avg_candle_volume)
                            * Decimal::from(100),
                    ),
                    distance_from_open_pct: None,
                },
                generated_at: inputs.now,
            });
            self.signaled.insert(symbol.clone());
        }
        signals
    }

    fn reset(&mut self) {
        self.signaled.clear();
    }
}
