//! Pipeline wrapper over `NewsSentimentGate` (§4.8, §4.13).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::NewsSentimentGate;
use crate::domain::repositories::EarningsCalendarRepository;
use crate::domain::sentiment::SentimentProvider;

pub struct NewsSentimentStage {
    gate: Arc<Mutex<NewsSentimentGate>>,
    provider: Arc<dyn SentimentProvider>,
    earnings: Arc<dyn EarningsCalendarRepository>,
}

impl NewsSentimentStage {
    /// `gate` is shared with the chat `UNSUPPRESS` command and the
    /// scheduler's daily reset (§4.15).
    pub fn new(
        gate: Arc<Mutex<NewsSentimentGate>>,
        provider: Arc<dyn SentimentProvider>,
        earnings: Arc<dyn EarningsCalendarRepository>,
    ) -> Self {
        Self {
            gate,
            provider,
            earnings,
        }
    }
}

#[async_trait]
impl PipelineStage for NewsSentimentStage {
    fn name(&self) -> &'static str {
        "news_sentiment"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        if ctx.ranked_signals.is_empty() {
            return Ok(ctx);
        }
        let symbols: Vec<String> = ctx
            .ranked_signals
            .iter()
            .map(|r| r.candidate.symbol.clone())
            .collect();
        match self.provider.fetch_sentiment(&symbols).await {
            Ok(fetched) => {
                for s in fetched {
                    ctx.sentiment_results.insert(s.symbol.clone(), s);
                }
            }
            Err(err) => {
                tracing::error!(%err, "news_sentiment: failed to fetch sentiment, gating on stale/empty results");
            }
        }

        let today = ctx.now.date_naive();
        let gate = self.gate.lock().await;
        let ranked = ctx.ranked_signals.clone();
        match gate
            .apply(ranked, &ctx.sentiment_results, today, self.earnings.as_ref())
            .await
        {
            Ok((kept, suppressed)) => {
                ctx.ranked_signals = kept;
                ctx.suppressed_signals.extend(suppressed);
            }
            Err(err) => {
                tracing::error!(%err, "news_sentiment: gate evaluation failed, leaving ranked signals unsuppressed");
            }
        }
        Ok(ctx)
    }
}
