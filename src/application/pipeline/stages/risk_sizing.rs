//! Pipeline wrapper over `RiskSizer` (§4.10, §4.13).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::RiskSizer;
use crate::domain::repositories::TradeRepository;

pub struct RiskSizingStage {
    sizer: RiskSizer,
    trades: Arc<dyn TradeRepository>,
}

impl RiskSizingStage {
    pub fn new(sizer: RiskSizer, trades: Arc<dyn TradeRepository>) -> Self {
        Self { sizer, trades }
    }
}

#[async_trait]
impl PipelineStage for RiskSizingStage {
    fn name(&self) -> &'static str {
        "risk_sizing"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.ranked_signals.is_empty() {
            return Ok(ctx);
        }
        ctx.active_trade_count = match self.trades.get_active_trade_count().await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(%err, "risk_sizing: failed to read active trade count");
                return Ok(ctx);
            }
        };
        let ranked = std::mem::take(&mut ctx.ranked_signals);

        let Some(user_config) = ctx.user_config.clone() else {
            return Ok(ctx);
        };
        let max_positions = ctx.regime_max_positions.unwrap_or(user_config.max_positions);

        ctx.final_signals = self.sizer.size(
            ranked,
            user_config.total_capital,
            max_positions,
            ctx.active_trade_count,
            ctx.regime_position_modifier,
            ctx.now,
        );
        Ok(ctx)
    }
}
