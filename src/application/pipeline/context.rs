//! Mutable state threaded through every pipeline stage in a single scan cycle
//! (§4.13).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::market::phase::StrategyPhase;
use crate::domain::regime::RegimeLabel;
use crate::domain::sentiment::SymbolSentiment;
use crate::application::risk_management::ConfirmedCandidate;
use crate::domain::signal::{
    CandidateSignal, ConfirmationLevel, FinalSignal, RankedSignal, StrategyName, SuppressedSignal,
};

/// A read-only snapshot of the operator-mutable settings a cycle runs with.
#[derive(Debug, Clone)]
pub struct UserConfigSnapshot {
    pub total_capital: Decimal,
    pub max_positions: usize,
    pub paused_strategies: Vec<StrategyName>,
}

#[derive(Debug, Clone)]
pub struct ScanContext {
    pub cycle_id: u64,
    pub now: DateTime<Utc>,
    pub phase: StrategyPhase,
    pub accepting_signals: bool,

    pub user_config: Option<UserConfigSnapshot>,
    pub enabled_strategies: Vec<StrategyName>,
    pub all_candidates: Vec<CandidateSignal>,

    pub confirmation_map: HashMap<String, ConfirmationLevel>,
    pub confirmed_candidates: Vec<ConfirmedCandidate>,
    pub composite_scores: HashMap<String, Decimal>,
    pub ranked_signals: Vec<RankedSignal>,

    pub sentiment_results: HashMap<String, SymbolSentiment>,
    pub suppressed_signals: Vec<SuppressedSignal>,

    pub final_signals: Vec<FinalSignal>,
    pub active_trade_count: usize,

    pub regime: Option<RegimeLabel>,
    pub regime_confidence: f64,
    pub regime_min_stars: u8,
    pub regime_position_modifier: Decimal,
    pub regime_max_positions: Option<usize>,
    pub regime_strategy_weights: HashMap<StrategyName, Decimal>,
}

impl ScanContext {
    pub fn new(cycle_id: u64, now: DateTime<Utc>, phase: StrategyPhase, accepting_signals: bool) -> Self {
        Self {
            cycle_id,
            now,
            phase,
            accepting_signals,
            user_config: None,
            enabled_strategies: Vec::new(),
            all_candidates: Vec::new(),
            confirmation_map: HashMap::new(),
            confirmed_candidates: Vec::new(),
            composite_scores: HashMap::new(),
            ranked_signals: Vec::new(),
            sentiment_results: HashMap::new(),
            suppressed_signals: Vec::new(),
            final_signals: Vec::new(),
            active_trade_count: 0,
            regime: None,
            regime_confidence: 0.0,
            regime_min_stars: 3,
            regime_position_modifier: Decimal::ONE,
            regime_max_positions: None,
            regime_strategy_weights: HashMap::new(),
        }
    }
}
