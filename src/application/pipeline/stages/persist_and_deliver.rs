//! Terminal signal stage: persists every accepted `FinalSignal` and hands the
//! batch to the chat gateway for delivery (§4.13, §11.1).

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::chat::formatters::format_final_signal;
use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::domain::ports::ChatGateway;
use crate::domain::repositories::SignalRepository;

pub struct PersistAndDeliverStage {
    signals: Arc<dyn SignalRepository>,
    chat: Arc<dyn ChatGateway>,
}

impl PersistAndDeliverStage {
    pub fn new(signals: Arc<dyn SignalRepository>, chat: Arc<dyn ChatGateway>) -> Self {
        Self { signals, chat }
    }
}

#[async_trait]
impl PipelineStage for PersistAndDeliverStage {
    fn name(&self) -> &'static str {
        "persist_and_deliver"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.final_signals.is_empty() {
            return Ok(ctx);
        }
        let final_signals = std::mem::take(&mut ctx.final_signals);
        for signal in final_signals {
            let signal_id = match self.signals.insert_signal(&signal).await {
                Ok(id) => id,
                Err(err) => {
                    tracing::error!(symbol = %signal.ranked.candidate.symbol, %err, "persist_and_deliver: failed to persist signal");
                    continue;
                }
            };
            if let Err(err) = self.chat.send(format_final_signal(signal_id, &signal)).await {
                tracing::error!(symbol = %signal.ranked.candidate.symbol, %err, "persist_and_deliver: failed to deliver signal");
            }
            ctx.final_signals.push(signal);
        }
        Ok(ctx)
    }
}
