//! Removes or dampens ranked candidates based on external sentiment (§4.8).

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::config::NewsGateConfig;
use crate::domain::repositories::EarningsCalendarRepository;
use crate::domain::sentiment::{SentimentLabel, SymbolSentiment};
use crate::domain::signal::{RankedSignal, SuppressedSignal};

pub struct NewsSentimentGate {
    config: NewsGateConfig,
    unsuppressed_today: HashSet<String>,
}

impl NewsSentimentGate {
    pub fn new(config: NewsGateConfig) -> Self {
        Self {
            config,
            unsuppressed_today: HashSet::new(),
        }
    }

    /// Bypasses suppression for `symbol` for the remainder of the trading day.
    pub fn unsuppress(&mut self, symbol: &str) {
        self.unsuppressed_today.insert(symbol.to_string());
    }

    pub fn daily_reset(&mut self) {
        self.unsuppressed_today.clear();
    }

    pub async fn apply(
        &self,
        ranked: Vec<RankedSignal>,
        sentiment: &HashMap<String, SymbolSentiment>,
        today: NaiveDate,
        earnings: &dyn EarningsCalendarRepository,
    ) -> anyhow::Result<(Vec<RankedSignal>, Vec<SuppressedSignal>)> {
        if !self.config.enabled {
            return Ok((ranked, Vec::new()));
        }

        let mut kept = Vec::with_capacity(ranked.len());
        let mut suppressed = Vec::new();

        for mut signal in ranked {
            let symbol = signal.candidate.symbol.clone();
            if self.unsuppressed_today.contains(&symbol) {
                kept.push(signal);
                continue;
            }

            let has_earnings = self.config.earnings_blackout_enabled
                && earnings.has_earnings_today(&symbol, today).await?;

            let label = sentiment.get(&symbol).map(|s| s.label);

            if has_earnings || label == Some(SentimentLabel::StrongNegative) {
                let reason = if has_earnings {
                    "earnings release today".to_string()
                } else {
                    "strong negative sentiment".to_string()
                };
                suppressed.push(SuppressedSignal {
                    symbol,
                    strategy: signal.candidate.strategy,
                    reason,
                });
                continue;
            }

            if label == Some(SentimentLabel::MildNegative) {
                signal.signal_strength = signal.signal_strength.saturating_sub(1).max(1);
            }

            kept.push(signal);
        }

        Ok((kept, suppressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{
        CandidateFeatures, CandidateSignal, ConfirmationLevel, Direction, StrategyName,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct NoEarnings;

    #[async_trait::async_trait]
    impl EarningsCalendarRepository for NoEarnings {
        async fn has_earnings_today(&self, symbol: &str, _: NaiveDate) -> anyhow::Result<bool> {
            Ok(symbol == "INFY")
        }
    }

    fn ranked(symbol: &str, strength: u8) -> RankedSignal {
        RankedSignal {
            candidate: CandidateSignal {
                symbol: symbol.to_string(),
                direction: Direction::Buy,
                strategy: StrategyName::GapAndGo,
                setup: None,
                entry: dec!(100),
                stop_loss: dec!(98),
                target1: dec!(103),
                target2: dec!(105),
                features: CandidateFeatures::default(),
                generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap(),
            },
            composite_score: dec!(70),
            rank: 1,
            signal_strength: strength,
            confirmation: ConfirmationLevel::Single,
            contributing_strategies: vec![StrategyName::GapAndGo],
        }
    }

    fn config() -> NewsGateConfig {
        NewsGateConfig {
            enabled: true,
            strong_negative_threshold: -0.5,
            mild_negative_threshold: 0.0,
            earnings_blackout_enabled: true,
        }
    }

    #[tokio::test]
    async fn strong_negative_and_earnings_are_suppressed_mild_negative_dampens() {
        let gate = NewsSentimentGate::new(config());
        let earnings = NoEarnings;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut sentiment = HashMap::new();
        sentiment.insert(
            "RELIANCE".to_string(),
            SymbolSentiment {
                symbol: "RELIANCE".to_string(),
                label: SentimentLabel::StrongNegative,
                score: -0.8,
                headline: None,
                earnings_today: false,
                fetched_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            },
        );
        sentiment.insert(
            "SBIN".to_string(),
            SymbolSentiment {
                symbol: "SBIN".to_string(),
                label: SentimentLabel::MildNegative,
                score: -0.2,
                headline: None,
                earnings_today: false,
                fetched_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            },
        );

        let ranked_signals = vec![ranked("RELIANCE", 4), ranked("SBIN", 3), ranked("INFY", 5)];
        let (kept, suppressed) = gate
            .apply(ranked_signals, &sentiment, today, &earnings)
            .await
            .unwrap();

        assert_eq!(suppressed.len(), 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].candidate.symbol, "SBIN");
        assert_eq!(kept[0].signal_strength, 2);
    }

    #[tokio::test]
    async fn unsuppress_override_bypasses_strong_negative() {
        let mut gate = NewsSentimentGate::new(config());
        gate.unsuppress("RELIANCE");
        let earnings = NoEarnings;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut sentiment = HashMap::new();
        sentiment.insert(
            "RELIANCE".to_string(),
            SymbolSentiment {
                symbol: "RELIANCE".to_string(),
                label: SentimentLabel::StrongNegative,
                score: -0.9,
                headline: None,
                earnings_today: false,
                fetched_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            },
        );
        let (kept, suppressed) = gate
            .apply(vec![ranked("RELIANCE", 4)], &sentiment, today, &earnings)
            .await
            .unwrap();
        assert!(suppressed.is_empty());
        assert_eq!(kept.len(), 1);
    }
}
