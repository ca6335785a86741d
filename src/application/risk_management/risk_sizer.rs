//! Sizes ranked signals into `FinalSignal`s against total capital, max concurrent
//! positions, and per-trade risk (§4.10).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::RiskSizerConfig;
use crate::domain::signal::{ConfirmationLevel, FinalSignal, RankedSignal};

pub struct RiskSizer {
    config: RiskSizerConfig,
}

impl RiskSizer {
    pub fn new(config: RiskSizerConfig) -> Self {
        Self { config }
    }

    /// `position_modifier` comes from the active `RegimeClassification`, or 1 when
    /// no regime has been classified yet.
    pub fn size(
        &self,
        ranked: Vec<RankedSignal>,
        total_capital: Decimal,
        max_positions: usize,
        active_trade_count: usize,
        position_modifier: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<FinalSignal> {
        if max_positions == 0 {
            return Vec::new();
        }
        let per_trade_cap =
            total_capital / Decimal::from(max_positions) * position_modifier;
        let expires_at = now + chrono::Duration::minutes(self.config.signal_expiry_minutes);

        let mut accepted = 0usize;
        let mut out = Vec::new();

        for signal in ranked {
            if active_trade_count + accepted >= max_positions {
                break;
            }

            let entry = signal.candidate.entry;
            let risk_pct = (entry - signal.candidate.stop_loss) / entry * Decimal::from(100);
            if risk_pct > self.config.max_trade_risk_pct {
                continue;
            }

            let cap_multiplier = match signal.confirmation {
                ConfirmationLevel::Single => Decimal::ONE,
                ConfirmationLevel::Double => self.config.confirmed_double_cap,
                ConfirmationLevel::Triple => self.config.confirmed_triple_cap,
            };
            let capital_for_trade = per_trade_cap * cap_multiplier;

            let Some(quantity) = (capital_for_trade / entry).to_i64() else {
                continue;
            };
            if quantity < 1 {
                continue;
            }

            let capital_required = entry * Decimal::from(quantity);
            out.push(FinalSignal {
                ranked: signal,
                quantity,
                capital_required,
                expires_at,
            });
            accepted += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{CandidateFeatures, CandidateSignal, Direction, StrategyName};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ranked(symbol: &str, entry: Decimal, sl: Decimal, confirmation: ConfirmationLevel) -> RankedSignal {
        RankedSignal {
            candidate: CandidateSignal {
                symbol: symbol.to_string(),
                direction: Direction::Buy,
                strategy: StrategyName::GapAndGo,
                setup: None,
                entry,
                stop_loss: sl,
                target1: entry * dec!(1.02),
                target2: entry * dec!(1.04),
                features: CandidateFeatures::default(),
                generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap(),
            },
            composite_score: dec!(70),
            rank: 1,
            signal_strength: 3,
            confirmation,
            contributing_strategies: vec![StrategyName::GapAndGo],
        }
    }

    fn config() -> RiskSizerConfig {
        RiskSizerConfig {
            confirmed_double_cap: dec!(1.5),
            confirmed_triple_cap: dec!(2.0),
            signal_expiry_minutes: 10,
            max_trade_risk_pct: dec!(1.5),
        }
    }

    #[test]
    fn sizes_within_per_trade_cap_and_rejects_excess_risk() {
        let sizer = RiskSizer::new(config());
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let ranked_signals = vec![
            ranked("SBIN", dec!(100), dec!(98.5), ConfirmationLevel::Single),
            ranked("TCS", dec!(100), dec!(90), ConfirmationLevel::Single),
        ];
        let finals = sizer.size(ranked_signals, dec!(100000), 5, 0, Decimal::ONE, now);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].ranked.candidate.symbol, "SBIN");
        assert_eq!(finals[0].quantity, 200);
    }

    #[test]
    fn confirmed_double_gets_capital_multiplier() {
        let sizer = RiskSizer::new(config());
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let ranked_signals = vec![ranked(
            "SBIN",
            dec!(100),
            dec!(98.5),
            ConfirmationLevel::Double,
        )];
        let finals = sizer.size(ranked_signals, dec!(100000), 5, 0, Decimal::ONE, now);
        assert_eq!(finals[0].quantity, 300);
    }

    #[test]
    fn stops_accepting_once_max_positions_reached() {
        let sizer = RiskSizer::new(config());
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let ranked_signals = vec![ranked("SBIN", dec!(100), dec!(99), ConfirmationLevel::Single)];
        let finals = sizer.size(ranked_signals, dec!(100000), 5, 5, Decimal::ONE, now);
        assert!(finals.is_empty());
    }
}
