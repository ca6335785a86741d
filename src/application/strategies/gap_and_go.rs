//! Gap & Go: scans the opening gap during `Opening`, validates cumulative volume,
//! then confirms direction during `EntryWindow` (§4.2).

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::application::market_data::MarketDataStore;
use crate::config::GapAndGoConfig;
use crate::domain::market::phase::StrategyPhase;
use crate::domain::signal::{CandidateFeatures, CandidateSignal, Direction, SetupKind, StrategyName};

use super::traits::{Strategy, StrategyInputs};

const ACTIVE_PHASES: &[StrategyPhase] = &[StrategyPhase::Opening, StrategyPhase::EntryWindow];

#[derive(Debug, Clone, Copy)]
struct GapCandidate {
    open: Decimal,
    gap_pct: Decimal,
}

pub struct GapAndGoStrategy {
    config: GapAndGoConfig,
    candidates: HashMap<String, GapCandidate>,
    volume_validated: HashMap<String, Decimal>,
    disqualified: HashSet<String>,
    signaled: HashSet<String>,
}

impl GapAndGoStrategy {
    pub fn new(config: GapAndGoConfig) -> Self {
        Self {
            config,
            candidates: HashMap::new(),
            volume_validated: HashMap::new(),
            disqualified: HashSet::new(),
            signaled: HashSet::new(),
        }
    }

    async fn scan_for_gaps(&mut self, store: &MarketDataStore, symbols: &[String]) {
        for symbol in symbols {
            if self.candidates.contains_key(symbol) {
                continue;
            }
            let (Some(tick), Some(historical)) = (
                store.get_tick(symbol).await,
                store.get_historical(symbol).await,
            ) else {
                continue;
            };
            let gap_pct = tick.gap_pct(historical.prev_close);
            let gap_in_band = gap_pct >= self.config.gap_min_pct && gap_pct <= self.config.gap_max_pct;
            if gap_in_band && tick.open > historical.prev_high {
                self.candidates.insert(
                    symbol.clone(),
                    GapCandidate {
                        open: tick.open,
                        gap_pct,
                    },
                );
            }
        }
    }

    async fn validate_volume(&mut self, store: &MarketDataStore) {
        let symbols: Vec<String> = self.candidates.keys().cloned().collect();
        for symbol in symbols {
            if self.volume_validated.contains_key(&symbol) {
                continue;
            }
            let (Some(tick), Some(historical)) = (
                store.get_tick(&symbol).await,
                store.get_historical(&symbol).await,
            ) else {
                continue;
            };
            if historical.avg_daily_volume.is_zero() {
                continue;
            }
            let ratio =
                Decimal::from(tick.cum_volume) / historical.avg_daily_volume * Decimal::from(100);
            if ratio >= self.config.volume_threshold_pct {
                self.volume_validated.insert(symbol, ratio);
            }
        }
    }

    async fn confirm_entries(
        &mut self,
        store: &MarketDataStore,
        now: DateTime<Utc>,
    ) -> Vec<CandidateSignal> {
        let mut signals = Vec::new();
        let candidates: Vec<(String, Decimal)> = self
            .volume_validated
            .iter()
            .map(|(symbol, ratio)| (symbol.clone(), *ratio))
            .collect();

        for (symbol, volume_ratio_pct) in candidates {
            if self.signaled.contains(&symbol) || self.disqualified.contains(&symbol) {
                continue;
            }
            let Some(candidate) = self.candidates.get(&symbol).copied() else {
                continue;
            };
            let Some(tick) = store.get_tick(&symbol).await else {
                continue;
            };

            if tick.ltp <= candidate.open {
                self.disqualified.insert(symbol);
                continue;
            }

            let entry = tick.ltp;
            let risk_sl = entry * (Decimal::ONE - self.config.max_risk_pct / Decimal::from(100));
            let stop_loss = candidate.open.max(risk_sl);
            let target1 = entry * (Decimal::ONE + self.config.t1_pct / Decimal::from(100));
            let target2 = entry * (Decimal::ONE + self.config.t2_pct / Decimal::from(100));
            let distance_from_open_pct = (entry - candidate.open) / candidate.open * Decimal::from(100);

            signals.push(CandidateSignal {
                symbol: symbol.clone(),
                direction: Direction::Buy,
                strategy: StrategyName::GapAndGo,
                setup: Some(SetupKind::GapAndGo),
                entry,
                stop_loss,
                target1,
                target2,
                features: CandidateFeatures {
                    gap_pct: Some(candidate.gap_pct),
                    volume_ratio_pct: Some(volume_ratio_pct),
                    distance_from_open_pct: Some(distance_from_open_pct),
                },
                generated_at: now,
            });
            self.signaled.insert(symbol);
        }
        signals
    }
}

#[async_trait]
impl Strategy for GapAndGoStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::GapAndGo
    }

    fn active_phases(&self) -> &'static [StrategyPhase] {
        ACTIVE_PHASES
    }

    async fn evaluate(
        &mut self,
        store: &MarketDataStore,
        inputs: &StrategyInputs<'_>,
    ) -> Vec<CandidateSignal> {
        match inputs.phase {
            StrategyPhase::Opening => {
                self.scan_for_gaps(store, inputs.symbols).await;
                self.validate_volume(store).await;
                Vec::new()
            }
            StrategyPhase::EntryWindow => {
                self.validate_volume(store).await;
                self.confirm_entries(store, inputs.now).await
            }
            _ => Vec::new(),
        }
    }

    /// The candidate set this strategy has marked, regardless of confirmation
    /// outcome — ORB must not trade a symbol Gap & Go has already claimed.
    fn flagged_symbols(&self) -> HashSet<String> {
        self.candidates.keys().cloned().collect()
    }

    fn reset(&mut self) {
        self.candidates.clear();
        self.volume_validated.clear();
        self.disqualified.clear();
        self.signaled.clear();
    }
}
