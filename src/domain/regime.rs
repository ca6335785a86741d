use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::signal::StrategyName;

/// A discrete label describing the day's character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeLabel {
    Trending,
    Ranging,
    Volatile,
}

impl RegimeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RegimeLabel::Trending => "trending",
            RegimeLabel::Ranging => "ranging",
            RegimeLabel::Volatile => "volatile",
        }
    }

    /// Parses the chat surface's `REGIME OVERRIDE <label>` argument, case-insensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TRENDING" => Some(RegimeLabel::Trending),
            "RANGING" => Some(RegimeLabel::Ranging),
            "VOLATILE" => Some(RegimeLabel::Volatile),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three convex-combination scores computed at each classification checkpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegimeScores {
    pub trending: f64,
    pub ranging: f64,
    pub volatile: f64,
}

impl RegimeScores {
    pub fn winner(self) -> (RegimeLabel, f64) {
        let mut best = (RegimeLabel::Trending, self.trending);
        if self.ranging > best.1 {
            best = (RegimeLabel::Ranging, self.ranging);
        }
        if self.volatile > best.1 {
            best = (RegimeLabel::Volatile, self.volatile);
        }
        best
    }
}

/// A cached regime classification, created once at 09:30 IST and optionally
/// reclassified at configured checkpoints. Feeds `RiskSizer` and `NewsSentimentGate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub label: RegimeLabel,
    pub confidence: f64,
    pub strategy_weights: HashMap<StrategyName, Decimal>,
    pub min_star_rating: u8,
    pub position_size_scalar: Option<Decimal>,
    pub classified_at: DateTime<Utc>,
    pub manually_overridden: bool,
}

impl RegimeClassification {
    pub fn weight_for(&self, strategy: StrategyName) -> Decimal {
        self.strategy_weights
            .get(&strategy)
            .copied()
            .unwrap_or(Decimal::ONE)
    }
}
