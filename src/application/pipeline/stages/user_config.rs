//! Loads the operator-mutable config snapshot and the set of non-paused
//! strategies, ahead of `StrategyEvalStage` (§4.13).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext, UserConfigSnapshot};
use crate::domain::repositories::UserConfigRepository;
use crate::domain::signal::StrategyName;

const ALL_STRATEGIES: &[StrategyName] = &[
    StrategyName::GapAndGo,
    StrategyName::OpeningRangeBreakout,
    StrategyName::VwapReversal,
];

pub struct UserConfigStage {
    repo: Arc<dyn UserConfigRepository>,
    default_max_positions: usize,
}

impl UserConfigStage {
    pub fn new(repo: Arc<dyn UserConfigRepository>, default_max_positions: usize) -> Self {
        Self {
            repo,
            default_max_positions,
        }
    }
}

#[async_trait]
impl PipelineStage for UserConfigStage {
    fn name(&self) -> &'static str {
        "user_config"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        let total_capital = match self.repo.get_total_capital().await {
            Ok(capital) => capital,
            Err(err) => {
                tracing::error!(%err, "user_config: failed to load total capital");
                return Ok(ctx);
            }
        };
        let mut paused = Vec::new();
        let mut enabled = Vec::new();
        for strategy in ALL_STRATEGIES {
            match self.repo.is_strategy_paused(*strategy).await {
                Ok(true) => paused.push(*strategy),
                Ok(false) => enabled.push(*strategy),
                Err(err) => {
                    tracing::error!(?strategy, %err, "user_config: failed to read pause state, treating as enabled");
                    enabled.push(*strategy);
                }
            }
        }
        ctx.enabled_strategies = enabled;
        ctx.user_config = Some(UserConfigSnapshot {
            total_capital,
            max_positions: self.default_max_positions,
            paused_strategies: paused,
        });
        Ok(ctx)
    }
}
