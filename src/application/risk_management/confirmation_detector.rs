//! Groups candidates by symbol within a sliding confirmation window, assigning a
//! `ConfirmationLevel` from the count of distinct contributing strategies (§4.4).

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::signal::{CandidateSignal, ConfirmationLevel, StrategyName};

#[derive(Debug, Clone)]
pub struct ConfirmedCandidate {
    pub candidate: CandidateSignal,
    pub confirmation: ConfirmationLevel,
    pub contributing_strategies: Vec<StrategyName>,
}

pub struct ConfirmationDetector {
    window_minutes: i64,
    history: HashMap<String, Vec<(StrategyName, DateTime<Utc>)>>,
}

impl ConfirmationDetector {
    pub fn new(window_minutes: i64) -> Self {
        Self {
            window_minutes,
            history: HashMap::new(),
        }
    }

    /// Records each candidate's strategy/timestamp, prunes entries outside the
    /// window, and returns every candidate paired with its confirmation level.
    pub fn process(
        &mut self,
        candidates: Vec<CandidateSignal>,
        now: DateTime<Utc>,
    ) -> Vec<ConfirmedCandidate> {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let entry = self.history.entry(candidate.symbol.clone()).or_default();
            entry.push((candidate.strategy, candidate.generated_at));
            entry.retain(|(_, at)| (now - *at).num_minutes() <= self.window_minutes);

            let mut contributing: Vec<StrategyName> =
                entry.iter().map(|(strategy, _)| *strategy).collect();
            contributing.sort_by_key(|s| s.as_str());
            contributing.dedup();

            let confirmation = ConfirmationLevel::from_count(contributing.len());
            out.push(ConfirmedCandidate {
                candidate,
                confirmation,
                contributing_strategies: contributing,
            });
        }
        out
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{CandidateFeatures, Direction};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candidate(symbol: &str, strategy: StrategyName, at: DateTime<Utc>) -> CandidateSignal {
        CandidateSignal {
            symbol: symbol.to_string(),
            direction: Direction::Buy,
            strategy,
            setup: None,
            entry: dec!(100),
            stop_loss: dec!(98),
            target1: dec!(102),
            target2: dec!(104),
            features: CandidateFeatures::default(),
            generated_at: at,
        }
    }

    #[test]
    fn two_strategies_within_window_confirm_double() {
        let mut detector = ConfirmationDetector::new(5);
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let t1 = t0 + chrono::Duration::minutes(2);

        let first = detector.process(vec![candidate("SBIN", StrategyName::GapAndGo, t0)], t0);
        assert_eq!(first[0].confirmation, ConfirmationLevel::Single);

        let second = detector.process(
            vec![candidate("SBIN", StrategyName::OpeningRangeBreakout, t1)],
            t1,
        );
        assert_eq!(second[0].confirmation, ConfirmationLevel::Double);
        assert_eq!(second[0].contributing_strategies.len(), 2);
    }

    #[test]
    fn entries_outside_window_are_pruned() {
        let mut detector = ConfirmationDetector::new(5);
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let t_late = t0 + chrono::Duration::minutes(30);

        detector.process(vec![candidate("SBIN", StrategyName::GapAndGo, t0)], t0);
        let later = detector.process(
            vec![candidate("SBIN", StrategyName::OpeningRangeBreakout, t_late)],
            t_late,
        );
        assert_eq!(later[0].confirmation, ConfirmationLevel::Single);
    }
}
