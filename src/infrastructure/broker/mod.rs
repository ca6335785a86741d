//! A minimal in-memory `BrokerTransport` adapter: no production broker SDK
//! per the Non-goals, just enough surface for the core to authenticate,
//! subscribe, and fetch candles end-to-end in tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use crate::domain::market::{Candle15m, Instrument};
use crate::domain::ports::{AuthTokens, BrokerTick, BrokerTransport};

pub struct MockBrokerTransport {
    instruments: Vec<Instrument>,
    candles_by_token: Arc<RwLock<std::collections::HashMap<String, Vec<Candle15m>>>>,
}

impl MockBrokerTransport {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments,
            candles_by_token: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }

    /// Test/seed hook: installs canned candle history for a token.
    pub async fn seed_candles(&self, token: &str, candles: Vec<Candle15m>) {
        self.candles_by_token
            .write()
            .await
            .insert(token.to_string(), candles);
    }
}

#[async_trait]
impl BrokerTransport for MockBrokerTransport {
    async fn authenticate(&self) -> anyhow::Result<AuthTokens> {
        info!("mock broker: authenticated");
        Ok(AuthTokens {
            auth_token: "mock-auth-token".to_string(),
            feed_token: "mock-feed-token".to_string(),
        })
    }

    async fn subscribe(
        &self,
        tokens: &[String],
    ) -> anyhow::Result<mpsc::Receiver<(String, BrokerTick)>> {
        let (_tx, rx) = mpsc::channel(100);
        info!(count = tokens.len(), "mock broker: subscribed (no ticks will be pushed)");
        Ok(rx)
    }

    async fn get_candle_data(
        &self,
        _exchange: &str,
        token: &str,
        _interval: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Candle15m>> {
        Ok(self
            .candles_by_token
            .read()
            .await
            .get(token)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_instrument_master(&self) -> anyhow::Result<Vec<Instrument>> {
        Ok(self.instruments.clone())
    }

    async fn disconnect(&self) {
        info!("mock broker: disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn authenticate_returns_mock_tokens() {
        let broker = MockBrokerTransport::new(vec![]);
        let tokens = broker.authenticate().await.unwrap();
        assert_eq!(tokens.auth_token, "mock-auth-token");
    }

    #[tokio::test]
    async fn instrument_master_returns_seeded_instruments() {
        let broker = MockBrokerTransport::new(vec![Instrument::new("SBIN", "3045", "NSE", 1)]);
        let instruments = broker.get_instrument_master().await.unwrap();
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].symbol, "SBIN");
    }
}
