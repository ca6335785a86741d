//! Pipeline wrapper over `DuplicateChecker` (§4.3, §4.13).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::DuplicateChecker;
use crate::domain::repositories::{SignalRepository, TradeRepository};

pub struct DuplicateFilterStage {
    trades: Arc<dyn TradeRepository>,
    signals: Arc<dyn SignalRepository>,
}

impl DuplicateFilterStage {
    pub fn new(trades: Arc<dyn TradeRepository>, signals: Arc<dyn SignalRepository>) -> Self {
        Self { trades, signals }
    }
}

#[async_trait]
impl PipelineStage for DuplicateFilterStage {
    fn name(&self) -> &'static str {
        "duplicate_filter"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.all_candidates.is_empty() {
            return Ok(ctx);
        }
        let today = ctx.now.date_naive();
        let candidates = ctx.all_candidates.clone();
        match DuplicateChecker::filter(candidates, today, self.trades.as_ref(), self.signals.as_ref())
            .await
        {
            Ok(survivors) => ctx.all_candidates = survivors,
            Err(err) => {
                tracing::error!(%err, "duplicate_filter: lookup failed, leaving candidates unfiltered");
            }
        }
        Ok(ctx)
    }
}
