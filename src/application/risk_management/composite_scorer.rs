//! Composite scoring combining strategy regime weight, rolling win rate, risk/reward,
//! and confirmation bonus, all normalized to [0, 100] (§4.5).

use rust_decimal::Decimal;

use crate::config::ScoringWeights;
use crate::domain::regime::RegimeClassification;
use crate::domain::repositories::StrategyPerformanceRepository;
use crate::domain::signal::{CandidateSignal, ConfirmationLevel};

pub struct CompositeScorer<'a> {
    weights: &'a ScoringWeights,
}

impl<'a> CompositeScorer<'a> {
    pub fn new(weights: &'a ScoringWeights) -> Self {
        Self { weights }
    }

    pub async fn score(
        &self,
        candidate: &CandidateSignal,
        confirmation: ConfirmationLevel,
        regime: Option<&RegimeClassification>,
        performance: &dyn StrategyPerformanceRepository,
    ) -> anyhow::Result<Decimal> {
        let strategy_strength_score = regime
            .map(|r| r.weight_for(candidate.strategy) * Decimal::from(100))
            .unwrap_or(Decimal::from(100));

        let win_rate_score = performance
            .rolling_win_rate_pct(candidate.strategy, 10)
            .await?;

        let risk_reward_score = Self::risk_reward_bucket(candidate.risk_reward_ratio());
        let confirmation_bonus = confirmation.bonus();

        Ok(self.weights.strategy * strategy_strength_score
            + self.weights.win_rate * win_rate_score
            + self.weights.risk_reward * risk_reward_score
            + self.weights.confirmation * confirmation_bonus)
    }

    fn risk_reward_bucket(rr: Decimal) -> Decimal {
        if rr >= Decimal::from(3) {
            Decimal::from(100)
        } else if rr >= Decimal::from(2) {
            Decimal::from(80)
        } else if rr >= Decimal::new(15, 1) {
            Decimal::from(60)
        } else if rr >= Decimal::from(1) {
            Decimal::from(40)
        } else {
            Decimal::from(20)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{CandidateFeatures, Direction, StrategyName};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct FixedWinRate(Decimal);

    #[async_trait]
    impl StrategyPerformanceRepository for FixedWinRate {
        async fn record_outcome(
            &self,
            _: StrategyName,
            _: bool,
            _: chrono::DateTime<Utc>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn rolling_win_rate_pct(&self, _: StrategyName, _: u32) -> anyhow::Result<Decimal> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn composite_score_is_within_0_100() {
        let weights = ScoringWeights {
            strategy: dec!(0.30),
            win_rate: dec!(0.30),
            risk_reward: dec!(0.25),
            confirmation: dec!(0.15),
        };
        let candidate = CandidateSignal {
            symbol: "SBIN".to_string(),
            direction: Direction::Buy,
            strategy: StrategyName::GapAndGo,
            setup: None,
            entry: dec!(105),
            stop_loss: dec!(104),
            target1: dec!(110.25),
            target2: dec!(112.35),
            features: CandidateFeatures::default(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap(),
        };
        let performance = FixedWinRate(dec!(60));
        let scorer = CompositeScorer::new(&weights);
        let score = scorer
            .score(&candidate, ConfirmationLevel::Double, None, &performance)
            .await
            .unwrap();
        assert!(score >= Decimal::ZERO && score <= Decimal::from(100));
    }
}
