//! The stage protocol and the two-group runner (§4.13).

use async_trait::async_trait;

use crate::domain::market::phase::StrategyPhase;

use super::context::ScanContext;

#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn process(&self, ctx: ScanContext) -> anyhow::Result<ScanContext>;
}

const ACTIVE_SIGNAL_PHASES: &[StrategyPhase] = &[
    StrategyPhase::Opening,
    StrategyPhase::EntryWindow,
    StrategyPhase::Continuous,
];

pub struct Pipeline {
    signal_stages: Vec<Box<dyn PipelineStage>>,
    always_stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn new(
        signal_stages: Vec<Box<dyn PipelineStage>>,
        always_stages: Vec<Box<dyn PipelineStage>>,
    ) -> Self {
        Self {
            signal_stages,
            always_stages,
        }
    }

    pub async fn run(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.accepting_signals && ACTIVE_SIGNAL_PHASES.contains(&ctx.phase) {
            for stage in &self.signal_stages {
                tracing::debug!(stage = stage.name(), cycle_id = ctx.cycle_id, "running signal stage");
                ctx = stage.process(ctx).await?;
            }
        }

        for stage in &self.always_stages {
            tracing::debug!(stage = stage.name(), cycle_id = ctx.cycle_id, "running always stage");
            ctx = stage.process(ctx).await?;
        }

        Ok(ctx)
    }
}
