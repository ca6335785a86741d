//! Per-strategy NORMAL/REDUCED/PAUSED state machine driven by consecutive trade
//! outcomes and rolling win rate (§4.6).

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::AdaptiveConfig;
use crate::domain::repositories::{AdaptationLogRepository, StrategyPerformanceRepository};
use crate::domain::signal::StrategyName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveLevel {
    Normal,
    Reduced,
    Paused,
}

impl AdaptiveLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AdaptiveLevel::Normal => "NORMAL",
            AdaptiveLevel::Reduced => "REDUCED",
            AdaptiveLevel::Paused => "PAUSED",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StrategyState {
    level_is_reduced: bool,
    level_is_paused: bool,
    consecutive_losses: u32,
}

impl StrategyState {
    fn level(&self) -> AdaptiveLevel {
        if self.level_is_paused {
            AdaptiveLevel::Paused
        } else if self.level_is_reduced {
            AdaptiveLevel::Reduced
        } else {
            AdaptiveLevel::Normal
        }
    }
}

pub struct AdaptiveManager {
    config: AdaptiveConfig,
    state: HashMap<StrategyName, StrategyState>,
}

impl AdaptiveManager {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            state: HashMap::new(),
        }
    }

    pub fn level(&self, strategy: StrategyName) -> AdaptiveLevel {
        self.state
            .get(&strategy)
            .map(|s| s.level())
            .unwrap_or(AdaptiveLevel::Normal)
    }

    pub fn should_allow_signal(&self, strategy: StrategyName, signal_strength: u8) -> bool {
        match self.level(strategy) {
            AdaptiveLevel::Normal => true,
            AdaptiveLevel::Reduced => signal_strength >= 4,
            AdaptiveLevel::Paused => false,
        }
    }

    /// Applies a trade outcome and persists any resulting level transition.
    pub async fn record_outcome(
        &mut self,
        strategy: StrategyName,
        won: bool,
        at: DateTime<Utc>,
        log: &dyn AdaptationLogRepository,
    ) -> anyhow::Result<()> {
        let entry = self.state.entry(strategy).or_default();
        let before = entry.level();

        if won {
            entry.consecutive_losses = 0;
            entry.level_is_reduced = false;
            entry.level_is_paused = false;
        } else {
            entry.consecutive_losses += 1;
            if entry.consecutive_losses >= self.config.consecutive_losses_pause {
                entry.level_is_paused = true;
            } else if entry.consecutive_losses >= self.config.consecutive_losses_throttle {
                entry.level_is_reduced = true;
            }
        }

        let after = entry.level();
        if after != before {
            log.record_transition(
                strategy,
                at,
                after.as_str(),
                if won {
                    "win reset consecutive losses"
                } else {
                    "consecutive loss threshold reached"
                },
            )
            .await?;
        }
        Ok(())
    }

    /// Checks trailing win rate windows and auto-pauses/warns as needed, logging
    /// any transition it causes.
    pub async fn check_rolling_win_rate(
        &mut self,
        strategy: StrategyName,
        at: DateTime<Utc>,
        performance: &dyn StrategyPerformanceRepository,
        log: &dyn AdaptationLogRepository,
    ) -> anyhow::Result<()> {
        let five_day = performance.rolling_win_rate_pct(strategy, 5).await?;
        if five_day < self.config.five_day_win_rate_warn_pct {
            tracing::warn!(
                strategy = strategy.as_str(),
                win_rate_pct = %five_day,
                "5-day rolling win rate below warn threshold"
            );
        }

        let ten_day = performance.rolling_win_rate_pct(strategy, 10).await?;
        if ten_day < self.config.ten_day_win_rate_pause_pct {
            let entry = self.state.entry(strategy).or_default();
            let before = entry.level();
            entry.level_is_paused = true;
            if entry.level() != before {
                log.record_transition(
                    strategy,
                    at,
                    "PAUSED",
                    "10-day rolling win rate below pause threshold",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Zeroes daily consecutive-loss counters and level overrides at session start,
    /// preserving whatever `StrategyPerformanceRepository` tracks on its own.
    pub fn daily_reset(&mut self) {
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullLog;

    #[async_trait::async_trait]
    impl AdaptationLogRepository for NullLog {
        async fn record_transition(
            &self,
            _: StrategyName,
            _: DateTime<Utc>,
            _: &str,
            _: &str,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn config() -> AdaptiveConfig {
        AdaptiveConfig {
            consecutive_losses_throttle: 3,
            consecutive_losses_pause: 5,
            five_day_win_rate_warn_pct: rust_decimal_macros::dec!(40),
            ten_day_win_rate_pause_pct: rust_decimal_macros::dec!(30),
        }
    }

    fn now() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap()
    }

    #[tokio::test]
    async fn three_losses_reduce_five_losses_pause() {
        let mut manager = AdaptiveManager::new(config());
        let log = NullLog;
        for _ in 0..3 {
            manager
                .record_outcome(StrategyName::GapAndGo, false, now(), &log)
                .await
                .unwrap();
        }
        assert_eq!(manager.level(StrategyName::GapAndGo), AdaptiveLevel::Reduced);
        assert!(!manager.should_allow_signal(StrategyName::GapAndGo, 3));
        assert!(manager.should_allow_signal(StrategyName::GapAndGo, 4));

        for _ in 0..2 {
            manager
                .record_outcome(StrategyName::GapAndGo, false, now(), &log)
                .await
                .unwrap();
        }
        assert_eq!(manager.level(StrategyName::GapAndGo), AdaptiveLevel::Paused);
        assert!(!manager.should_allow_signal(StrategyName::GapAndGo, 5));
    }

    #[tokio::test]
    async fn a_win_resets_level_to_normal() {
        let mut manager = AdaptiveManager::new(config());
        let log = NullLog;
        for _ in 0..3 {
            manager
                .record_outcome(StrategyName::OpeningRangeBreakout, false, now(), &log)
                .await
                .unwrap();
        }
        assert_eq!(
            manager.level(StrategyName::OpeningRangeBreakout),
            AdaptiveLevel::Reduced
        );
        manager
            .record_outcome(StrategyName::OpeningRangeBreakout, true, now(), &log)
            .await
            .unwrap();
        assert_eq!(
            manager.level(StrategyName::OpeningRangeBreakout),
            AdaptiveLevel::Normal
        );
    }
}
