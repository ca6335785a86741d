//! Push-based metrics reporter for SignalPilot
//!
//! Periodically outputs metrics as structured JSON to stdout and updates the
//! Prometheus gauges in `Metrics`. No HTTP server, no incoming connections --
//! only outbound data.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::risk_management::CircuitBreaker;
use crate::domain::repositories::TradeRepository;
use crate::infrastructure::observability::metrics::Metrics;

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub active_trade_count: usize,
    pub sl_count_today: u32,
    pub circuit_tripped: bool,
}

/// Push-based metrics reporter: outputs metrics as structured JSON logs on a
/// configurable interval and keeps the `Metrics` gauges in sync with current
/// trade/circuit state.
pub struct MetricsReporter {
    trades: Arc<dyn TradeRepository>,
    circuit: Arc<Mutex<CircuitBreaker>>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    /// `circuit` is the same instance the pipeline's `CircuitBreakerGateStage`
    /// gates on, so the reported `sl_count_today`/`circuit_tripped` always
    /// match what the scan loop is actually acting on.
    pub fn new(
        trades: Arc<dyn TradeRepository>,
        circuit: Arc<Mutex<CircuitBreaker>>,
        metrics: Metrics,
        interval_seconds: u64,
    ) -> Self {
        Self {
            trades,
            circuit,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// Runs the reporter loop until the process exits.
    pub async fn run(self) {
        info!(interval = ?self.interval, "metrics reporter starting");

        loop {
            tokio::time::sleep(self.interval).await;

            match self.collect_snapshot().await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        println!("METRICS_JSON:{}", json);
                        info!(
                            active_trades = snapshot.active_trade_count,
                            sl_today = snapshot.sl_count_today,
                            uptime = snapshot.uptime_seconds,
                            "metrics snapshot"
                        );
                    }
                    Err(err) => warn!(%err, "failed to serialize metrics snapshot"),
                },
                Err(err) => warn!(%err, "failed to collect metrics snapshot"),
            }
        }
    }

    async fn collect_snapshot(&self) -> anyhow::Result<MetricsSnapshot> {
        let active_trade_count = self.trades.get_active_trade_count().await?;
        let circuit = self.circuit.lock().await;
        let state = circuit.state();
        let uptime = self.start_time.elapsed().as_secs();

        self.metrics.active_trade_count.set(active_trade_count as f64);
        self.metrics.sl_count_today.set(state.sl_count as f64);

        Ok(MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_trade_count,
            sl_count_today: state.sl_count,
            circuit_tripped: state.triggered_at.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Trade;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::RwLock as StdRwLock;

    struct FakeTradeRepository {
        active: StdRwLock<Vec<Trade>>,
    }

    #[async_trait]
    impl TradeRepository for FakeTradeRepository {
        async fn insert_trade(&self, _trade: &Trade) -> anyhow::Result<i64> {
            Ok(1)
        }
        async fn close_trade(
            &self,
            _id: i64,
            _exit_price: rust_decimal::Decimal,
            _pnl_abs: rust_decimal::Decimal,
            _pnl_pct: rust_decimal::Decimal,
            _reason: crate::domain::trade::ExitReason,
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn get_active_trades(&self) -> anyhow::Result<Vec<Trade>> {
            Ok(self.active.read().unwrap().clone())
        }
        async fn get_active_trade_count(&self) -> anyhow::Result<usize> {
            Ok(self.active.read().unwrap().len())
        }
        async fn has_active_trade(&self, _symbol: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn snapshot_reflects_active_trade_count_and_circuit_state() {
        let trade = Trade {
            id: 1,
            signal_id: 1,
            symbol: "SBIN".to_string(),
            entry_price: dec!(500),
            stop_loss: dec!(490),
            target1: dec!(510),
            target2: dec!(520),
            quantity: 10,
            taken_at: chrono::Utc::now(),
            closed: None,
        };
        let trades = Arc::new(FakeTradeRepository {
            active: StdRwLock::new(vec![trade]),
        });
        let circuit_state = crate::domain::circuit::CircuitState {
            sl_count: 2,
            triggered_at: None,
            manual_override: false,
        };
        let circuit = Arc::new(Mutex::new(CircuitBreaker::new(
            crate::config::CircuitConfig { sl_limit: 3 },
            circuit_state,
        )));
        let metrics = Metrics::new().expect("metrics");
        let reporter = MetricsReporter::new(trades, circuit, metrics, 60);

        let snapshot = reporter.collect_snapshot().await.unwrap();
        assert_eq!(snapshot.active_trade_count, 1);
        assert_eq!(snapshot.sl_count_today, 2);
        assert!(!snapshot.circuit_tripped);
    }
}
