use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::market_data::MarketDataStore;
use crate::domain::market::phase::StrategyPhase;
use crate::domain::signal::{CandidateSignal, StrategyName};

/// Per-tick inputs handed to every strategy's `evaluate`. `gap_flagged_symbols`
/// carries the symbols the GapStockMarking stage has already claimed, which ORB
/// must exclude (§4.2).
pub struct StrategyInputs<'a> {
    pub symbols: &'a [String],
    pub phase: StrategyPhase,
    pub now: DateTime<Utc>,
    pub gap_flagged_symbols: &'a HashSet<String>,
}

/// One of the closed set of long-only strategies (§4.2). Each strategy keeps
/// per-session state (candidates seen, symbols already signaled) cleared by
/// `reset()` at daily session start.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> StrategyName;

    /// Phases in which this strategy is willing to produce candidates at all.
    fn active_phases(&self) -> &'static [StrategyPhase];

    async fn evaluate(
        &mut self,
        store: &MarketDataStore,
        inputs: &StrategyInputs<'_>,
    ) -> Vec<CandidateSignal>;

    /// Symbols this strategy has flagged this session (feeds GapStockMarking for
    /// strategies other strategies must exclude, e.g. Gap & Go's candidates).
    fn flagged_symbols(&self) -> HashSet<String> {
        HashSet::new()
    }

    fn reset(&mut self);
}
