//! Pipeline wrapper over `ConfirmationDetector` (§4.4, §4.13).

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::ConfirmationDetector;

pub struct ConfirmationStage {
    detector: Mutex<ConfirmationDetector>,
}

impl ConfirmationStage {
    pub fn new(detector: ConfirmationDetector) -> Self {
        Self {
            detector: Mutex::new(detector),
        }
    }
}

#[async_trait]
impl PipelineStage for ConfirmationStage {
    fn name(&self) -> &'static str {
        "confirmation"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.all_candidates.is_empty() {
            return Ok(ctx);
        }
        let candidates = std::mem::take(&mut ctx.all_candidates);
        let mut detector = self.detector.lock().await;
        let confirmed = detector.process(candidates, ctx.now);

        for c in &confirmed {
            ctx.confirmation_map
                .insert(c.candidate.symbol.clone(), c.confirmation);
        }
        ctx.confirmed_candidates = confirmed;
        Ok(ctx)
    }
}
