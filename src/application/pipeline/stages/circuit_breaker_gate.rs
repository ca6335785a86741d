//! Short-circuits the remaining signal stages once the `CircuitBreaker` is
//! active by flipping `accepting_signals` off for the rest of this cycle
//! (§4.12, §4.13).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::pipeline::{PipelineStage, ScanContext};
use crate::application::risk_management::CircuitBreaker;

pub struct CircuitBreakerGateStage {
    breaker: Arc<Mutex<CircuitBreaker>>,
}

impl CircuitBreakerGateStage {
    pub fn new(breaker: Arc<Mutex<CircuitBreaker>>) -> Self {
        Self { breaker }
    }
}

#[async_trait]
impl PipelineStage for CircuitBreakerGateStage {
    fn name(&self) -> &'static str {
        "circuit_breaker_gate"
    }

    async fn process(&self, mut ctx: ScanContext) -> anyhow::Result<ScanContext> {
        let breaker = self.breaker.lock().await;
        if breaker.is_active() {
            ctx.accepting_signals = false;
            ctx.all_candidates.clear();
        }
        Ok(ctx)
    }
}
