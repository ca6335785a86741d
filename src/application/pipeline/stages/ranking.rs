//! Pipeline wrapper over `Ranker` (§4.9, §4.13).

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::Ranker;

pub struct RankingStage;

#[async_trait]
impl PipelineStage for RankingStage {
    fn name(&self) -> &'static str {
        "ranking"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.confirmed_candidates.is_empty() {
            ctx.ranked_signals = Vec::new();
            return Ok(ctx);
        }
        let scores = ctx.composite_scores.clone();
        let confirmed = std::mem::take(&mut ctx.confirmed_candidates);
        let scored = confirmed
            .into_iter()
            .map(|c| {
                let score = scores.get(&c.candidate.symbol).copied().unwrap_or_default();
                (c, score)
            })
            .collect();
        ctx.ranked_signals = Ranker::rank(scored);
        Ok(ctx)
    }
}
