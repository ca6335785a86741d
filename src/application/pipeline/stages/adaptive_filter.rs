//! Blocks confirmed candidates from strategies the `AdaptiveManager` has
//! throttled or paused (§4.6, §4.13).

use std::sync::Arc;

use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::AdaptiveManager;
use crate::domain::signal::RankedSignal;

pub struct AdaptiveFilterStage {
    manager: Arc<Mutex<AdaptiveManager>>,
}

impl AdaptiveFilterStage {
    /// `manager` is shared with the chat `PAUSE`/`RESUME`/`ADAPT` commands and
    /// the scheduler's daily reset (§4.15), so a pause takes effect on the
    /// very next scan cycle.
    pub fn new(manager: Arc<Mutex<AdaptiveManager>>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl PipelineStage for AdaptiveFilterStage {
    fn name(&self) -> &'static str {
        "adaptive_filter"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.confirmed_candidates.is_empty() {
            return Ok(ctx);
        }
        let manager = self.manager.lock().await;
        let scores = &ctx.composite_scores;
        let confirmed_candidates = &mut ctx.confirmed_candidates;
        confirmed_candidates.retain(|confirmed| {
            let score = scores
                .get(&confirmed.candidate.symbol)
                .copied()
                .unwrap_or_default();
            let strength = RankedSignal::strength_from_score(score);
            manager.should_allow_signal(confirmed.candidate.strategy, strength)
        });
        Ok(ctx)
    }
}
