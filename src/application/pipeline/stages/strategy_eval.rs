//! Runs every enabled strategy active in the current phase against the market
//! data store, threading Gap & Go's claimed symbols into later strategies
//! (§4.2, §4.13).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::market_data::MarketDataStore;
use crate::application::strategies::{Strategy, StrategyInputs};
use crate::application::pipeline::{PipelineStage, ScanContext};

pub struct StrategyEvalStage {
    strategies: Mutex<Vec<Box<dyn Strategy>>>,
    store: Arc<MarketDataStore>,
    symbols: Vec<String>,
}

impl StrategyEvalStage {
    pub fn new(strategies: Vec<Box<dyn Strategy>>, store: Arc<MarketDataStore>, symbols: Vec<String>) -> Self {
        Self {
            strategies: Mutex::new(strategies),
            store,
            symbols,
        }
    }
}

#[async_trait]
impl PipelineStage for StrategyEvalStage {
    fn name(&self) -> &'static str {
        "strategy_eval"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        let mut strategies = self.strategies.lock().await;
        let mut gap_flagged = std::collections::HashSet::new();

        for strategy in strategies.iter_mut() {
            if !ctx.enabled_strategies.contains(&strategy.name()) {
                continue;
            }
            if !strategy.active_phases().contains(&ctx.phase) {
                continue;
            }

            let inputs = StrategyInputs {
                symbols: &self.symbols,
                phase: ctx.phase,
                now: ctx.now,
                gap_flagged_symbols: &gap_flagged,
            };
            let mut candidates = strategy.evaluate(&self.store, &inputs).await;
            gap_flagged.extend(strategy.flagged_symbols());
            ctx.all_candidates.append(&mut candidates);
        }

        Ok(ctx)
    }
}
