//! Prometheus metrics definitions for SignalPilot
//!
//! All metrics use the `signalpilot_` prefix and are read-only from outside
//! this module.

use prometheus::{
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the signal engine
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Number of currently open trades
    pub active_trade_count: GenericGauge<AtomicF64>,
    /// Count of stop-loss exits so far in the current session
    pub sl_count_today: GenericGauge<AtomicF64>,
    /// Whether the scan engine is currently accepting new signals (0/1)
    pub accepting_signals: GenericGauge<AtomicF64>,
    /// Per-strategy adaptive level (0=NORMAL, 1=REDUCED, 2=PAUSED)
    pub strategy_adaptive_level: GenericGaugeVec<AtomicF64>,
    /// Scan cycle duration in seconds
    pub scan_cycle_duration_seconds: HistogramVec,
    /// Consecutive scan-cycle failures since the last success
    pub scan_consecutive_errors: GenericGauge<AtomicF64>,
    /// Total signals emitted, by strategy and outcome
    pub signals_total: CounterVec,
    /// Regime classification confidence (0-1)
    pub regime_confidence: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let active_trade_count = Gauge::with_opts(Opts::new(
            "signalpilot_active_trade_count",
            "Number of currently open trades",
        ))?;
        registry.register(Box::new(active_trade_count.clone()))?;

        let sl_count_today = Gauge::with_opts(Opts::new(
            "signalpilot_sl_count_today",
            "Stop-loss exits so far in the current session",
        ))?;
        registry.register(Box::new(sl_count_today.clone()))?;

        let accepting_signals = Gauge::with_opts(Opts::new(
            "signalpilot_accepting_signals",
            "Whether the scan engine is accepting new signals (0/1)",
        ))?;
        registry.register(Box::new(accepting_signals.clone()))?;

        let strategy_adaptive_level = GaugeVec::new(
            Opts::new(
                "signalpilot_strategy_adaptive_level",
                "Per-strategy adaptive level (0=NORMAL, 1=REDUCED, 2=PAUSED)",
            ),
            &["strategy"],
        )?;
        registry.register(Box::new(strategy_adaptive_level.clone()))?;

        let scan_cycle_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "signalpilot_scan_cycle_duration_seconds",
                "Scan cycle duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
            &["phase"],
        )?;
        registry.register(Box::new(scan_cycle_duration_seconds.clone()))?;

        let scan_consecutive_errors = Gauge::with_opts(Opts::new(
            "signalpilot_scan_consecutive_errors",
            "Consecutive scan-cycle failures since the last success",
        ))?;
        registry.register(Box::new(scan_consecutive_errors.clone()))?;

        let signals_total = CounterVec::new(
            Opts::new("signalpilot_signals_total", "Total signals emitted"),
            &["strategy", "outcome"],
        )?;
        registry.register(Box::new(signals_total.clone()))?;

        let regime_confidence = Gauge::with_opts(Opts::new(
            "signalpilot_regime_confidence",
            "Regime classification confidence (0-1)",
        ))?;
        registry.register(Box::new(regime_confidence.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            active_trade_count,
            sl_count_today,
            accepting_signals,
            strategy_adaptive_level,
            scan_cycle_duration_seconds,
            scan_consecutive_errors,
            signals_total,
            regime_confidence,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Update the adaptive level gauge for one strategy
    pub fn set_adaptive_level(&self, strategy: &str, level: u8) {
        self.strategy_adaptive_level
            .with_label_values(&[strategy])
            .set(level as f64);
    }

    /// Observe a scan cycle's duration for the given phase
    pub fn observe_scan_cycle(&self, phase: &str, seconds: f64) {
        self.scan_cycle_duration_seconds
            .with_label_values(&[phase])
            .observe(seconds);
    }

    /// Increment the signals-emitted counter
    pub fn inc_signals(&self, strategy: &str, outcome: &str) {
        self.signals_total
            .with_label_values(&[strategy, outcome])
            .inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default Metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_includes_the_signalpilot_prefix() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        assert!(metrics.render().contains("signalpilot_"));
    }

    #[test]
    fn active_trade_count_is_rendered_after_being_set() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.active_trade_count.set(3.0);
        let output = metrics.render();
        assert!(output.contains("signalpilot_active_trade_count 3"));
    }

    #[test]
    fn adaptive_level_is_labeled_per_strategy() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.set_adaptive_level("GapAndGo", 1);
        metrics.set_adaptive_level("VwapReversal", 0);
        let output = metrics.render();
        assert!(output.contains("GapAndGo"));
        assert!(output.contains("VwapReversal"));
    }

    #[test]
    fn signals_counter_increments() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_signals("GapAndGo", "taken");
        metrics.inc_signals("GapAndGo", "skipped");
        let output = metrics.render();
        assert!(output.contains("signalpilot_signals_total"));
    }
}
