//! Pipeline wrapper over `CompositeScorer` (§4.5, §4.13).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::CompositeScorer;
use crate::config::ScoringWeights;
use crate::domain::regime::RegimeClassification;
use crate::domain::repositories::{RegimeRepository, StrategyPerformanceRepository};

pub struct CompositeScoringStage {
    weights: ScoringWeights,
    performance: Arc<dyn StrategyPerformanceRepository>,
    regime: Arc<dyn RegimeRepository>,
}

impl CompositeScoringStage {
    pub fn new(
        weights: ScoringWeights,
        performance: Arc<dyn StrategyPerformanceRepository>,
        regime: Arc<dyn RegimeRepository>,
    ) -> Self {
        Self {
            weights,
            performance,
            regime,
        }
    }
}

#[async_trait]
impl PipelineStage for CompositeScoringStage {
    fn name(&self) -> &'static str {
        "composite_scoring"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.confirmed_candidates.is_empty() {
            return Ok(ctx);
        }
        let scorer = CompositeScorer::new(&self.weights);
        let regime: Option<RegimeClassification> = match self.regime.get_latest().await {
            Ok(regime) => regime,
            Err(err) => {
                tracing::error!(%err, "composite_scoring: failed to load regime classification");
                return Ok(ctx);
            }
        };

        for confirmed in &ctx.confirmed_candidates {
            match scorer
                .score(
                    &confirmed.candidate,
                    confirmed.confirmation,
                    regime.as_ref(),
                    self.performance.as_ref(),
                )
                .await
            {
                Ok(score) => {
                    ctx.composite_scores
                        .insert(confirmed.candidate.symbol.clone(), score);
                }
                Err(err) => {
                    tracing::error!(symbol = %confirmed.candidate.symbol, %err, "composite_scoring: failed to score candidate");
                }
            }
        }
        Ok(ctx)
    }
}
