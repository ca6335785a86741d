use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-symbol news sentiment label consumed by `NewsSentimentGate` (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    StrongNegative,
    MildNegative,
    Neutral,
    Positive,
    NoNews,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongNegative => write!(f, "Strong Negative"),
            Self::MildNegative => write!(f, "Mild Negative"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Positive => write!(f, "Positive"),
            Self::NoNews => write!(f, "No News"),
        }
    }
}

impl SentimentLabel {
    /// Classifies a raw compound score in `[-1, 1]` against the configured
    /// strong-negative threshold (e.g. -0.5) and a fixed mild-negative/positive split.
    pub fn from_score(score: f64, strong_negative_threshold: f64) -> Self {
        if score <= strong_negative_threshold {
            Self::StrongNegative
        } else if score < 0.0 {
            Self::MildNegative
        } else if score > 0.1 {
            Self::Positive
        } else {
            Self::Neutral
        }
    }
}

/// A sentiment reading for a single symbol, as returned by the external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSentiment {
    pub symbol: String,
    pub label: SentimentLabel,
    pub score: f64,
    pub headline: Option<String>,
    pub earnings_today: bool,
    pub fetched_at: DateTime<Utc>,
}

/// The external sentiment collaborator (§6). Implementations fetch sentiment for a
/// batch of symbols in one round trip; the core never blocks per-symbol.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn fetch_sentiment(&self, symbols: &[String]) -> anyhow::Result<Vec<SymbolSentiment>>;
}
