//! Classifies the day's regime as a convex combination of five market-wide inputs,
//! caching the winning label and the strategy weights/min-star-rating it implies
//! (§4.7).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::regime::{RegimeClassification, RegimeLabel, RegimeScores};
use crate::domain::repositories::RegimeRepository;
use crate::domain::signal::StrategyName;

/// Raw observations fed into the classifier at 09:30 IST and each checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct RegimeInputs {
    /// India VIX level.
    pub india_vix: f64,
    /// Nifty gap at open, as a signed percentage.
    pub nifty_gap_pct: f64,
    /// First-15-minute range as a percentage of the prior close.
    pub first_15m_range_pct: f64,
    /// +1.0 fully aligned with the gap direction, -1.0 fully opposed.
    pub first_15m_directional_alignment: f64,
    /// S&P 500 overnight change, percent.
    pub sp500_change_pct: f64,
    /// SGX Nifty direction at pre-open, -1.0/0.0/+1.0.
    pub sgx_nifty_direction: f64,
    /// Net institutional (FII+DII) flow, in crores, signed.
    pub institutional_flow_cr: f64,
}

pub struct RegimeClassifier {
    weights: RegimeClassifierWeights,
}

/// Convex-combination weights for the three label scores. Each inner weight
/// applies to the same normalized input across all three labels.
#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifierWeights {
    pub vix: f64,
    pub gap: f64,
    pub range_alignment: f64,
    pub external: f64,
    pub institutional_flow: f64,
}

impl Default for RegimeClassifierWeights {
    fn default() -> Self {
        Self {
            vix: 0.25,
            gap: 0.2,
            range_alignment: 0.25,
            external: 0.15,
            institutional_flow: 0.15,
        }
    }
}

impl RegimeClassifier {
    pub fn new(weights: RegimeClassifierWeights) -> Self {
        Self { weights }
    }

    fn score(&self, inputs: &RegimeInputs) -> RegimeScores {
        let vix_volatile = (inputs.india_vix / 30.0).clamp(0.0, 1.0);
        let gap_trend = (inputs.nifty_gap_pct.abs() / 1.0).clamp(0.0, 1.0);
        let alignment_trend =
            ((inputs.first_15m_directional_alignment + 1.0) / 2.0).clamp(0.0, 1.0);
        let range_ranging = (1.0 - (inputs.first_15m_range_pct / 0.5).clamp(0.0, 1.0)).max(0.0);
        let external_trend =
            ((inputs.sp500_change_pct.signum() * inputs.sgx_nifty_direction + 1.0) / 2.0)
                .clamp(0.0, 1.0);
        let flow_trend = ((inputs.institutional_flow_cr.signum() + 1.0) / 2.0).clamp(0.0, 1.0);

        let trending = self.weights.vix * (1.0 - vix_volatile)
            + self.weights.gap * gap_trend
            + self.weights.range_alignment * alignment_trend
            + self.weights.external * external_trend
            + self.weights.institutional_flow * flow_trend;

        let volatile = self.weights.vix * vix_volatile
            + self.weights.gap * gap_trend
            + self.weights.range_alignment * (1.0 - alignment_trend)
            + self.weights.external * (1.0 - external_trend)
            + self.weights.institutional_flow * (1.0 - flow_trend);

        let ranging = self.weights.vix * (1.0 - vix_volatile)
            + self.weights.gap * (1.0 - gap_trend)
            + self.weights.range_alignment * range_ranging
            + self.weights.external * 0.5
            + self.weights.institutional_flow * 0.5;

        RegimeScores {
            trending,
            ranging,
            volatile,
        }
    }

    fn strategy_weights_for(label: RegimeLabel) -> HashMap<StrategyName, Decimal> {
        use rust_decimal_macros::dec;
        let mut weights = HashMap::new();
        match label {
            RegimeLabel::Trending => {
                weights.insert(StrategyName::GapAndGo, dec!(1.2));
                weights.insert(StrategyName::OpeningRangeBreakout, dec!(1.2));
                weights.insert(StrategyName::VwapReversal, dec!(0.8));
            }
            RegimeLabel::Ranging => {
                weights.insert(StrategyName::GapAndGo, dec!(0.8));
                weights.insert(StrategyName::OpeningRangeBreakout, dec!(0.8));
                weights.insert(StrategyName::VwapReversal, dec!(1.2));
            }
            RegimeLabel::Volatile => {
                weights.insert(StrategyName::GapAndGo, dec!(0.6));
                weights.insert(StrategyName::OpeningRangeBreakout, dec!(0.6));
                weights.insert(StrategyName::VwapReversal, dec!(0.6));
            }
        }
        weights
    }

    fn min_star_rating_for(label: RegimeLabel) -> u8 {
        match label {
            RegimeLabel::Trending => 2,
            RegimeLabel::Ranging => 3,
            RegimeLabel::Volatile => 4,
        }
    }

    /// Computes a fresh classification from `inputs` and persists it.
    pub async fn classify(
        &self,
        inputs: RegimeInputs,
        at: DateTime<Utc>,
        repo: &dyn RegimeRepository,
    ) -> anyhow::Result<RegimeClassification> {
        let scores = self.score(&inputs);
        let (label, confidence) = scores.winner();
        let classification = RegimeClassification {
            label,
            confidence,
            strategy_weights: Self::strategy_weights_for(label),
            min_star_rating: Self::min_star_rating_for(label),
            position_size_scalar: None,
            classified_at: at,
            manually_overridden: false,
        };
        repo.save_classification(&classification).await?;
        Ok(classification)
    }

    /// Replaces the cached label without recomputing scores.
    pub async fn manual_override(
        &self,
        label: RegimeLabel,
        at: DateTime<Utc>,
        repo: &dyn RegimeRepository,
    ) -> anyhow::Result<RegimeClassification> {
        let classification = RegimeClassification {
            label,
            confidence: 1.0,
            strategy_weights: Self::strategy_weights_for(label),
            min_star_rating: Self::min_star_rating_for(label),
            position_size_scalar: None,
            classified_at: at,
            manually_overridden: true,
        };
        repo.save_classification(&classification).await?;
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct RecordingRepo {
        saved: std::sync::Mutex<Option<RegimeClassification>>,
    }

    #[async_trait::async_trait]
    impl RegimeRepository for RecordingRepo {
        async fn save_classification(&self, c: &RegimeClassification) -> anyhow::Result<()> {
            *self.saved.lock().unwrap() = Some(c.clone());
            Ok(())
        }
        async fn get_latest(&self) -> anyhow::Result<Option<RegimeClassification>> {
            Ok(self.saved.lock().unwrap().clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn strong_directional_open_classifies_trending() {
        let classifier = RegimeClassifier::new(RegimeClassifierWeights::default());
        let repo = RecordingRepo {
            saved: std::sync::Mutex::new(None),
        };
        let inputs = RegimeInputs {
            india_vix: 11.0,
            nifty_gap_pct: 0.9,
            first_15m_range_pct: 0.45,
            first_15m_directional_alignment: 0.9,
            sp500_change_pct: 0.8,
            sgx_nifty_direction: 1.0,
            institutional_flow_cr: 500.0,
        };
        let classification = classifier.classify(inputs, now(), &repo).await.unwrap();
        assert_eq!(classification.label, RegimeLabel::Trending);
        assert!(!classification.manually_overridden);
    }

    #[tokio::test]
    async fn high_vix_choppy_open_classifies_volatile() {
        let classifier = RegimeClassifier::new(RegimeClassifierWeights::default());
        let repo = RecordingRepo {
            saved: std::sync::Mutex::new(None),
        };
        let inputs = RegimeInputs {
            india_vix: 28.0,
            nifty_gap_pct: 0.8,
            first_15m_range_pct: 0.1,
            first_15m_directional_alignment: -0.8,
            sp500_change_pct: -0.5,
            sgx_nifty_direction: 1.0,
            institutional_flow_cr: -300.0,
        };
        let classification = classifier.classify(inputs, now(), &repo).await.unwrap();
        assert_eq!(classification.label, RegimeLabel::Volatile);
    }

    #[tokio::test]
    async fn manual_override_skips_scoring() {
        let classifier = RegimeClassifier::new(RegimeClassifierWeights::default());
        let repo = RecordingRepo {
            saved: std::sync::Mutex::new(None),
        };
        let classification = classifier
            .manual_override(RegimeLabel::Ranging, now(), &repo)
            .await
            .unwrap();
        assert!(classification.manually_overridden);
        assert_eq!(classification.confidence, 1.0);
    }
}
