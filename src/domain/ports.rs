//! External collaborator ports (§6). Each trait is the contract the core consumes;
//! concrete adapters live under `infrastructure/` with a `Mock*` implementation used
//! by tests and, pending a production integration, by the running process too.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::market::{Candle15m, Instrument};

/// One broker-pushed market update, already paise-adjusted (§6: `last_traded_price`
/// divided by 100 before it reaches this type).
#[derive(Debug, Clone, Copy)]
pub struct BrokerTick {
    pub ltp: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub cum_volume: i64,
    pub timestamp: DateTime<Utc>,
}

/// Tokens returned by a successful broker authentication handshake.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub auth_token: String,
    pub feed_token: String,
}

/// The broker authentication + WebSocket + REST collaborator (§6). The WebSocket
/// side is modeled as a subscription that yields `(token, BrokerTick)` pairs over a
/// channel rather than raw callbacks — §5's "callback-from-foreign-thread" note says
/// a port should bridge this via a channel, so the trait bakes that in instead of
/// exposing `onData` directly.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    async fn authenticate(&self) -> anyhow::Result<AuthTokens>;

    /// Subscribes to the given broker tokens and returns a receiver of tick updates.
    /// The receiver is fed by a background task; `recv()` is the thread-safe hand-off
    /// point the main scheduler drains from.
    async fn subscribe(
        &self,
        tokens: &[String],
    ) -> anyhow::Result<tokio::sync::mpsc::Receiver<(String, BrokerTick)>>;

    async fn get_candle_data(
        &self,
        exchange: &str,
        token: &str,
        interval: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Candle15m>>;

    async fn get_instrument_master(&self) -> anyhow::Result<Vec<Instrument>>;

    async fn disconnect(&self);
}

/// A second OHLCV provider used when the primary broker fails for a symbol (§6).
#[async_trait]
pub trait HistoricalProvider: Send + Sync {
    async fn get_last_n_sessions(
        &self,
        symbol: &str,
        sessions: u32,
    ) -> anyhow::Result<Vec<Candle15m>>;
}

/// An inline button attached to an outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatButton {
    pub label: String,
    pub callback_data: String,
}

/// An outbound message with optional button rows.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub text: String,
    pub buttons: Vec<Vec<ChatButton>>,
}

impl ChatMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

/// The chat command/keyboard surface (§6, §11.1). All inbound text/callbacks are
/// validated against the configured chat id before reaching the command dispatcher;
/// this port only has to deliver and receive, not authorize.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, message: ChatMessage) -> anyhow::Result<()>;
}
