//! The ~1 Hz scan loop: builds a fresh `ScanContext` every tick, runs it
//! through the `Pipeline`, and carries `accepting_signals` forward to the
//! next cycle (§4.13).
//!
//! Too many consecutive pipeline failures trip a halt rather than spinning
//! forever against a broken dependency (broker feed down, DB unreachable).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};

use crate::application::pipeline::{Pipeline, ScanContext};
use crate::domain::market::phase::StrategyPhase;
use crate::domain::ports::ChatGateway;

pub struct ScanEngine {
    pipeline: Pipeline,
    chat: Arc<dyn ChatGateway>,
    scan_interval: Duration,
    max_consecutive_errors: u32,
    cycle_id: AtomicU64,
    accepting_signals: AtomicBool,
    halted: AtomicBool,
}

impl ScanEngine {
    pub fn new(
        pipeline: Pipeline,
        chat: Arc<dyn ChatGateway>,
        scan_interval: Duration,
        max_consecutive_errors: u32,
    ) -> Self {
        Self {
            pipeline,
            chat,
            scan_interval,
            max_consecutive_errors,
            cycle_id: AtomicU64::new(0),
            accepting_signals: AtomicBool::new(true),
            halted: AtomicBool::new(false),
        }
    }

    pub fn accepting_signals(&self) -> bool {
        self.accepting_signals.load(Ordering::Relaxed)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Relaxed)
    }

    /// Requests an orderly stop; the in-flight cycle finishes, the next
    /// `interval.tick()` observes the flag, and `run()` returns.
    pub fn request_halt(&self) {
        self.halted.store(true, Ordering::Relaxed);
    }

    /// Runs until halted by consecutive scan failures. Never returns on the
    /// happy path -- intended to be spawned as a long-lived task.
    pub async fn run(&self) {
        info!(interval = ?self.scan_interval, "scan engine started");
        let mut interval = time::interval(self.scan_interval);
        interval.tick().await;

        let mut consecutive_errors: u32 = 0;

        loop {
            interval.tick().await;

            if self.halted.load(Ordering::Relaxed) {
                return;
            }

            let now = Utc::now();
            let phase = StrategyPhase::from_ist_time(now.time());
            let cycle_id = self.cycle_id.fetch_add(1, Ordering::Relaxed);
            let ctx = ScanContext::new(cycle_id, now, phase, self.accepting_signals());

            match self.pipeline.run(ctx).await {
                Ok(ctx) => {
                    consecutive_errors = 0;
                    self.accepting_signals
                        .store(ctx.accepting_signals, Ordering::Relaxed);
                }
                Err(err) => {
                    consecutive_errors += 1;
                    warn!(cycle_id, %err, consecutive_errors, "scan cycle failed");
                    if consecutive_errors >= self.max_consecutive_errors {
                        error!(
                            consecutive_errors,
                            "halting scan engine after too many consecutive scan errors"
                        );
                        self.halted.store(true, Ordering::Relaxed);
                        self.accepting_signals.store(false, Ordering::Relaxed);
                        let _ = self
                            .chat
                            .send(crate::domain::ports::ChatMessage::plain(format!(
                                "CRITICAL: scan engine halted after {consecutive_errors} consecutive failures. Manual restart required."
                            )))
                            .await;
                        return;
                    }
                }
            }
        }
    }
}

/// Wraps a `ScanEngine` so the shared `accepting_signals` flag (read by chat
/// commands such as `STATUS`) can be observed without locking the engine
/// task itself.
pub struct ScanEngineHandle {
    pub engine: Arc<ScanEngine>,
}

impl ScanEngineHandle {
    pub fn new(engine: Arc<ScanEngine>) -> Self {
        Self { engine }
    }

    pub fn accepting_signals(&self) -> bool {
        self.engine.accepting_signals()
    }
}

// Retained for callers that need to serialize start/stop around the engine
// (the scheduler pauses/resumes scanning at fixed IST events, §4.14).
pub struct ScanEngineControl {
    pub paused: Mutex<bool>,
}

impl Default for ScanEngineControl {
    fn default() -> Self {
        Self {
            paused: Mutex::new(true),
        }
    }
}
