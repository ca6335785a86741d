use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Phase 1 is BUY-only; `Sell` is carried for forward compatibility with §9's
/// "extension is by adding an enum variant" note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

/// Which of the closed strategy set produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyName {
    GapAndGo,
    OpeningRangeBreakout,
    VwapReversal,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::GapAndGo => "gap_and_go",
            StrategyName::OpeningRangeBreakout => "orb",
            StrategyName::VwapReversal => "vwap_reversal",
        }
    }

    /// Parses the chat surface's short tokens (`GAP`, `ORB`, `VWAP`), case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "GAP" => Some(StrategyName::GapAndGo),
            "ORB" => Some(StrategyName::OpeningRangeBreakout),
            "VWAP" => Some(StrategyName::VwapReversal),
            _ => None,
        }
    }
}

impl std::fmt::Display for StrategyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy-specific sub-type, e.g. distinguishing VWAP Reversal's two setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupKind {
    GapAndGo,
    OrbBreakout,
    VwapUptrendPullback,
    VwapReclaim,
}

/// Strategy-specific feature scalars carried alongside a candidate, consumed by
/// `CompositeScorer` and surfaced verbatim in chat/journal output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CandidateFeatures {
    pub gap_pct: Option<Decimal>,
    pub volume_ratio_pct: Option<Decimal>,
    pub distance_from_open_pct: Option<Decimal>,
}

/// A candidate signal emitted directly by a strategy, before dedup/confirmation/scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub symbol: String,
    pub direction: Direction,
    pub strategy: StrategyName,
    pub setup: Option<SetupKind>,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target1: Decimal,
    pub target2: Decimal,
    pub features: CandidateFeatures,
    pub generated_at: DateTime<Utc>,
}

impl CandidateSignal {
    /// `(T1 − entry) / (entry − SL)`, the input to `CompositeScorer`'s risk-reward term.
    pub fn risk_reward_ratio(&self) -> Decimal {
        let risk = self.entry - self.stop_loss;
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        (self.target1 - self.entry) / risk
    }

    /// `(entry − SL) / entry × 100`.
    pub fn risk_pct(&self) -> Decimal {
        if self.entry.is_zero() {
            return Decimal::ZERO;
        }
        (self.entry - self.stop_loss) / self.entry * Decimal::from(100)
    }
}

/// Confirmation level: how many distinct strategies signaled the same symbol within
/// the confirmation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationLevel {
    Single,
    Double,
    Triple,
}

impl ConfirmationLevel {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 | 1 => ConfirmationLevel::Single,
            2 => ConfirmationLevel::Double,
            _ => ConfirmationLevel::Triple,
        }
    }

    /// Fixed-step composite scorer bonus: 0 / 50 / 100.
    pub fn bonus(self) -> Decimal {
        match self {
            ConfirmationLevel::Single => Decimal::ZERO,
            ConfirmationLevel::Double => Decimal::from(50),
            ConfirmationLevel::Triple => Decimal::from(100),
        }
    }
}

/// A candidate wrapped with its composite score, rank, and derived strength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSignal {
    pub candidate: CandidateSignal,
    pub composite_score: Decimal,
    pub rank: usize,
    pub signal_strength: u8,
    pub confirmation: ConfirmationLevel,
    pub contributing_strategies: Vec<StrategyName>,
}

impl RankedSignal {
    /// Fixed bands: `{>=80:5, >=65:4, >=50:3, >=35:2, else 1}`.
    pub fn strength_from_score(score: Decimal) -> u8 {
        if score >= Decimal::from(80) {
            5
        } else if score >= Decimal::from(65) {
            4
        } else if score >= Decimal::from(50) {
            3
        } else if score >= Decimal::from(35) {
            2
        } else {
            1
        }
    }
}

/// A ranked signal sized with quantity and capital, ready for persistence/delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSignal {
    pub ranked: RankedSignal,
    pub quantity: i64,
    pub capital_required: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a signal once persisted and delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    Sent,
    Taken,
    Skipped,
    Expired,
    Paper,
    PositionFull,
}

impl SignalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalStatus::Sent => "sent",
            SignalStatus::Taken => "taken",
            SignalStatus::Skipped => "skipped",
            SignalStatus::Expired => "expired",
            SignalStatus::Paper => "paper",
            SignalStatus::PositionFull => "position_full",
        }
    }
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalStatus {
    type Err = crate::domain::errors::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(SignalStatus::Sent),
            "taken" => Ok(SignalStatus::Taken),
            "skipped" => Ok(SignalStatus::Skipped),
            "expired" => Ok(SignalStatus::Expired),
            "paper" => Ok(SignalStatus::Paper),
            "position_full" => Ok(SignalStatus::PositionFull),
            other => Err(crate::domain::errors::DomainError::UnknownEnumValue {
                field: "signal_status",
                value: other.to_string(),
            }),
        }
    }
}

/// A reason a candidate never became a `FinalSignal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedSignal {
    pub symbol: String,
    pub strategy: StrategyName,
    pub reason: String,
}
