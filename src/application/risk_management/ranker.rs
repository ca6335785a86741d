//! Sorts confirmed candidates by composite score, assigning rank 1..N (§4.9).

use rust_decimal::Decimal;

use crate::domain::signal::RankedSignal;

use super::confirmation_detector::ConfirmedCandidate;

pub struct Ranker;

impl Ranker {
    /// `scored` pairs each confirmed candidate with its composite score from
    /// `CompositeScorer`. Sorts by score desc, tie-breaking by `generated_at` asc.
    pub fn rank(scored: Vec<(ConfirmedCandidate, Decimal)>) -> Vec<RankedSignal> {
        let mut scored = scored;
        scored.sort_by(|(a_candidate, a_score), (b_candidate, b_score)| {
            b_score
                .cmp(a_score)
                .then_with(|| {
                    a_candidate
                        .candidate
                        .generated_at
                        .cmp(&b_candidate.candidate.generated_at)
                })
        });

        scored
            .into_iter()
            .enumerate()
            .map(|(index, (confirmed, score))| RankedSignal {
                signal_strength: RankedSignal::strength_from_score(score),
                candidate: confirmed.candidate,
                composite_score: score,
                rank: index + 1,
                confirmation: confirmed.confirmation,
                contributing_strategies: confirmed.contributing_strategies,
            })
            .collect()
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

    fn confirmed(symbol: &str, generated_at: chrono::DateTime<Utc>) -> ConfirmedCandidate {
        ConfirmedCandidate {
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
                generated_at,
            },
            confirmation: ConfirmationLevel::Single,
            contributing_strategies: vec![StrategyName::GapAndGo],
        }
    }

    #[test]
    fn ranks_by_score_desc_tie_break_by_time_asc() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap();
        let t1 = t0 + chrono::Duration::minutes(1);
        let scored = vec![
            (confirmed("A", t1), dec!(70)),
            (confirmed("B", t0), dec!(90)),
            (confirmed("C", t0), dec!(70)),
        ];
        let ranked = Ranker::rank(scored);
        assert_eq!(ranked[0].candidate.symbol, "B");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].candidate.symbol, "C");
        assert_eq!(ranked[2].candidate.symbol, "A");
    }
}
