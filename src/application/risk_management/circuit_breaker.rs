//! Session kill switch: trips once today's SL-hit count reaches the configured
//! limit, gating the pipeline's signal stages until reset or manual override
//! (§4.12).

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::CircuitConfig;
use crate::domain::circuit::CircuitState;
use crate::domain::repositories::CircuitBreakerLogRepository;

pub struct CircuitBreaker {
    config: CircuitConfig,
    state: CircuitState,
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig, state: CircuitState) -> Self {
        Self { config, state }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active(self.config.sl_limit)
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Called by `ExitMonitor` whenever a trade closes with `sl_hit`.
    pub async fn record_sl_hit(
        &mut self,
        at: DateTime<Utc>,
        log: &dyn CircuitBreakerLogRepository,
    ) -> anyhow::Result<()> {
        self.state.sl_count += 1;
        if self.state.sl_count >= self.config.sl_limit && self.state.triggered_at.is_none() {
            self.state.triggered_at = Some(at);
            log.record_trip(at, self.state.sl_count).await?;
        }
        Ok(())
    }

    /// Manual operator override: clears the trip and re-enables signal acceptance
    /// for the rest of the day.
    pub fn manual_override(&mut self) {
        self.state.manual_override = true;
        self.state.triggered_at = None;
    }

    pub fn reset_daily(&mut self) {
        self.state = CircuitState::default();
    }

    pub async fn persist(
        &self,
        date: NaiveDate,
        log: &dyn CircuitBreakerLogRepository,
    ) -> anyhow::Result<()> {
        log.save_today(date, self.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingLog {
        trips: Mutex<Vec<(DateTime<Utc>, u32)>>,
    }

    #[async_trait::async_trait]
    impl CircuitBreakerLogRepository for RecordingLog {
        async fn record_trip(&self, at: DateTime<Utc>, sl_count: u32) -> anyhow::Result<()> {
            self.trips.lock().unwrap().push((at, sl_count));
            Ok(())
        }
        async fn load_today(&self, _: NaiveDate) -> anyhow::Result<CircuitState> {
            Ok(CircuitState::default())
        }
        async fn save_today(&self, _: NaiveDate, _: CircuitState) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn trips_once_limit_reached_and_logs_once() {
        let mut breaker = CircuitBreaker::new(CircuitConfig { sl_limit: 3 }, CircuitState::default());
        let log = RecordingLog {
            trips: Mutex::new(Vec::new()),
        };
        for _ in 0..3 {
            breaker.record_sl_hit(now(), &log).await.unwrap();
        }
        assert!(breaker.is_active());
        breaker.record_sl_hit(now(), &log).await.unwrap();
        assert_eq!(log.trips.lock().unwrap().len(), 1, "only trips once");
    }

    #[tokio::test]
    async fn manual_override_clears_trip() {
        let mut breaker = CircuitBreaker::new(CircuitConfig { sl_limit: 1 }, CircuitState::default());
        let log = RecordingLog {
            trips: Mutex::new(Vec::new()),
        };
        breaker.record_sl_hit(now(), &log).await.unwrap();
        assert!(breaker.is_active());
        breaker.manual_override();
        assert!(!breaker.is_active());
    }
}
