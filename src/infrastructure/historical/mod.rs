//! A minimal `HistoricalProvider` fallback adapter (§6): used when the
//! primary broker's historical fetch fails for a symbol. No production
//! second-source integration per the Non-goals -- seeded in-memory history,
//! sufficient for the core's fallback path to run end-to-end.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::market::Candle15m;
use crate::domain::ports::HistoricalProvider;

pub struct MockHistoricalProvider {
    candles_by_symbol: Arc<RwLock<HashMap<String, Vec<Candle15m>>>>,
}

impl MockHistoricalProvider {
    pub fn new() -> Self {
        Self {
            candles_by_symbol: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn seed(&self, symbol: &str, candles: Vec<Candle15m>) {
        self.candles_by_symbol
            .write()
            .await
            .insert(symbol.to_string(), candles);
    }
}

impl Default for MockHistoricalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoricalProvider for MockHistoricalProvider {
    async fn get_last_n_sessions(
        &self,
        symbol: &str,
        sessions: u32,
    ) -> anyhow::Result<Vec<Candle15m>> {
        let all = self
            .candles_by_symbol
            .read()
            .await
            .get(symbol)
            .cloned()
            .unwrap_or_default();
        let take_from = all.len().saturating_sub(sessions as usize);
        Ok(all[take_from..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn returns_only_the_last_n_sessions() {
        let provider = MockHistoricalProvider::new();
        let candles: Vec<Candle15m> = (0..5)
            .map(|_| Candle15m {
                bucket_start: Utc::now(),
                open: dec!(100),
                high: dec!(101),
                low: dec!(99),
                close: dec!(100),
                volume: 1000,
            })
            .collect();
        provider.seed("SBIN", candles).await;
        let last = provider.get_last_n_sessions("SBIN", 2).await.unwrap();
        assert_eq!(last.len(), 2);
    }

    #[tokio::test]
    async fn unseeded_symbol_returns_empty() {
        let provider = MockHistoricalProvider::new();
        let result = provider.get_last_n_sessions("TCS", 3).await.unwrap();
        assert!(result.is_empty());
    }
}
