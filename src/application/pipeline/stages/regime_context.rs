//! Reads the cached `RegimeClassification` into the context for downstream
//! stages; classification itself runs on the scheduler's cadence, not every
//! cycle (§4.7, §4.13).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::domain::repositories::RegimeRepository;

pub struct RegimeContextStage {
    regime: Arc<dyn RegimeRepository>,
}

impl RegimeContextStage {
    pub fn new(regime: Arc<dyn RegimeRepository>) -> Self {
        Self { regime }
    }
}

#[async_trait]
impl PipelineStage for RegimeContextStage {
    fn name(&self) -> &'static str {
        "regime_context"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        match self.regime.get_latest().await {
            Ok(Some(classification)) => {
                ctx.regime = Some(classification.label);
                ctx.regime_confidence = classification.confidence;
                ctx.regime_min_stars = classification.min_star_rating;
                ctx.regime_position_modifier = classification
                    .position_size_scalar
                    .unwrap_or(rust_decimal::Decimal::ONE);
                ctx.regime_strategy_weights = classification.strategy_weights;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(%err, "regime_context: failed to load latest classification");
            }
        }
        Ok(ctx)
    }
}
