//! Domain error enums, one per subsystem, following §7's error-kind taxonomy.
//!
//! Pipeline stages never propagate these — per §7's propagation policy, a stage
//! logs and returns the context unchanged. These types exist for the collaborators
//! that *do* return `Result`: persistence, the broker/chat/sentiment ports, and
//! configuration loading.

use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed construction paths for domain value types (e.g. deserializing an
/// unrecognized persisted enum column). Store operations themselves are infallible
/// against their inputs (§4.1).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown value {value:?} for field {field}")]
    UnknownEnumValue { field: &'static str, value: String },
}

/// A bounded-validation error from a strategy's own config (not a domain-invariant
/// violation — those are bugs, per §7).
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy {strategy} config invalid: {reason}")]
    InvalidConfig { strategy: &'static str, reason: String },
}

/// Errors from the broker transport/auth collaborator (§6). All are "transient
/// external" per §7 and are retried with exponential backoff by the caller.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    #[error("websocket connect timed out after {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },

    #[error("historical fetch failed for {symbol}: {reason}")]
    HistoricalFetchFailed { symbol: String, reason: String },

    #[error("instrument master lookup failed: {reason}")]
    InstrumentLookupFailed { reason: String },

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Errors from the chat gateway collaborator (§6).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message delivery failed: {reason}")]
    DeliveryFailed { reason: String },

    #[error("unauthorized chat id {chat_id}")]
    UnauthorizedChatId { chat_id: String },

    #[error("usage: {usage}")]
    BadCommand { usage: &'static str },
}

/// Errors from persistence (§6's abstract row store).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(String),

    #[error("signal {id} not found")]
    SignalNotFound { id: i64 },

    #[error("trade {id} not found")]
    TradeNotFound { id: i64 },
}

/// Errors surfaced while loading `Config` (§10.3). Distinct from the transient
/// external kind — these are startup-fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scoring weights must sum to 1.0 (got {sum})")]
    WeightsDoNotSumToOne { sum: Decimal },

    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_error_messages_are_descriptive() {
        let err = BrokerError::RateLimited {
            retry_after_secs: 30,
        };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn config_error_reports_sum() {
        let err = ConfigError::WeightsDoNotSumToOne {
            sum: Decimal::new(95, 2),
        };
        assert!(err.to_string().contains("0.95"));
    }
}
