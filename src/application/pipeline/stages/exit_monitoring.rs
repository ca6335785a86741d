//! Always-run stage: evaluates every open trade through `ExitMonitor`,
//! persists closures, and feeds SL-hit exits into the `CircuitBreaker`
//! (§4.11, §4.12, §4.13).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::chat::format_exit_alert;
use crate::application::market_data::MarketDataStore;
use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::{CircuitBreaker, ExitMonitor};
use crate::domain::ports::ChatGateway;
use crate::domain::repositories::{CircuitBreakerLogRepository, TradeRepository};
use crate::domain::trade::ExitReason;

pub struct ExitMonitoringStage {
    monitor: Arc<Mutex<ExitMonitor>>,
    breaker: Arc<Mutex<CircuitBreaker>>,
    store: Arc<MarketDataStore>,
    trades: Arc<dyn TradeRepository>,
    circuit_log: Arc<dyn CircuitBreakerLogRepository>,
    chat: Arc<dyn ChatGateway>,
}

impl ExitMonitoringStage {
    /// `monitor` is shared with the scheduler's advisory/mandatory exit jobs
    /// (§4.15) so trailing-stop state stays consistent across both callers.
    pub fn new(
        monitor: Arc<Mutex<ExitMonitor>>,
        breaker: Arc<Mutex<CircuitBreaker>>,
        store: Arc<MarketDataStore>,
        trades: Arc<dyn TradeRepository>,
        circuit_log: Arc<dyn CircuitBreakerLogRepository>,
        chat: Arc<dyn ChatGateway>,
    ) -> Self {
        Self {
            monitor,
            breaker,
            store,
            trades,
            circuit_log,
            chat,
        }
    }
}

#[async_trait]
impl PipelineStage for ExitMonitoringStage {
    fn name(&self) -> &'static str {
        "exit_monitoring"
    }

    async fn process(&self, ctx: ScanContext) -> anyhow::Result<ScanContext> {
        let open_trades = match self.trades.get_active_trades().await {
            Ok(trades) => trades,
            Err(err) => {
                tracing::error!(%err, "exit_monitoring: failed to load open trades");
                return Ok(ctx);
            }
        };
        if open_trades.is_empty() {
            return Ok(ctx);
        }

        let mut monitor = self.monitor.lock().await;
        let (closed, alerts) = monitor.evaluate(&open_trades, &self.store, ctx.now).await;
        drop(monitor);

        for alert in &alerts {
            if let Err(err) = self.chat.send(format_exit_alert(alert)).await {
                tracing::error!(%err, "exit_monitoring: failed to deliver exit alert");
            }
        }

        for (trade_id, closed_trade) in closed {
            if let Err(err) = self
                .trades
                .close_trade(
                    trade_id,
                    closed_trade.exit_price,
                    closed_trade.realized_pnl_abs,
                    closed_trade.realized_pnl_pct,
                    closed_trade.exit_reason,
                )
                .await
            {
                tracing::error!(trade_id, %err, "exit_monitoring: failed to persist trade closure");
                continue;
            }

            if closed_trade.exit_reason == ExitReason::SlHit {
                let mut breaker = self.breaker.lock().await;
                if let Err(err) = breaker
                    .record_sl_hit(closed_trade.exit_at, self.circuit_log.as_ref())
                    .await
                {
                    tracing::error!(trade_id, %err, "exit_monitoring: failed to record SL hit on circuit breaker");
                }
            }
        }

        Ok(ctx)
    }
}
