//! Drops candidates for symbols with an active trade or any persisted signal today,
//! regardless of status (§4.3). Pure I/O against persistence; no mutation.

use chrono::NaiveDate;

use crate::domain::repositories::{SignalRepository, TradeRepository};
use crate::domain::signal::CandidateSignal;

pub struct DuplicateChecker;

impl DuplicateChecker {
    pub async fn filter(
        candidates: Vec<CandidateSignal>,
        today: NaiveDate,
        trades: &dyn TradeRepository,
        signals: &dyn SignalRepository,
    ) -> anyhow::Result<Vec<CandidateSignal>> {
        let mut survivors = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if trades.has_active_trade(&candidate.symbol).await? {
                continue;
            }
            if signals
                .has_signal_for_stock_today(&candidate.symbol, today)
                .await?
            {
                continue;
            }
            survivors.push(candidate);
        }
        Ok(survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{CandidateFeatures, Direction, StrategyName};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeTrades {
        active: HashSet<String>,
    }

    #[async_trait]
    impl TradeRepository for FakeTrades {
        async fn insert_trade(&self, _: &crate::domain::trade::Trade) -> anyhow::Result<i64> {
            unimplemented!()
        }
        async fn close_trade(
            &self,
            _: i64,
            _: Decimal,
            _: Decimal,
            _: Decimal,
            _: crate::domain::trade::ExitReason,
        ) -> anyhow::Result<()> {
            unimplemented!()
        }
        async fn get_active_trades(&self) -> anyhow::Result<Vec<crate::domain::trade::Trade>> {
            Ok(vec![])
        }
        async fn get_active_trade_count(&self) -> anyhow::Result<usize> {
            Ok(self.active.len())
        }
        async fn has_active_trade(&self, symbol: &str) -> anyhow::Result<bool> {
            Ok(self.active.contains(symbol))
        }
    }

    struct FakeSignals {
        signaled_today: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl SignalRepository for FakeSignals {
        async fn insert_signal(
            &self,
            _: &crate::domain::signal::FinalSignal,
        ) -> anyhow::Result<i64> {
            Ok(1)
        }
        async fn update_signal_status(
            &self,
            _: i64,
            _: crate::domain::signal::SignalStatus,
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn get_active_signals(
            &self,
            _: chrono::NaiveDate,
            _: DateTime<Utc>,
        ) -> anyhow::Result<Vec<crate::domain::repositories::PersistedSignal>> {
            Ok(vec![])
        }
        async fn get_signal(
            &self,
            _: i64,
        ) -> anyhow::Result<Option<crate::domain::repositories::PersistedSignal>> {
            Ok(None)
        }
        async fn expire_stale_signals(&self, _: DateTime<Utc>) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn has_signal_for_stock_today(
            &self,
            symbol: &str,
            _: chrono::NaiveDate,
        ) -> anyhow::Result<bool> {
            Ok(self.signaled_today.lock().unwrap().contains(symbol))
        }
    }

    fn candidate(symbol: &str) -> CandidateSignal {
        use chrono::TimeZone;
        CandidateSignal {
            symbol: symbol.to_string(),
            direction: Direction::Buy,
            strategy: StrategyName::GapAndGo,
            setup: None,
            entry: dec!(100),
            stop_loss: dec!(98),
            target1: dec!(102),
            target2: dec!(104),
            features: CandidateFeatures::default(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn drops_symbols_with_active_trade_or_todays_signal() {
        let trades = FakeTrades {
            active: HashSet::from(["RELIANCE".to_string()]),
        };
        let signals = FakeSignals {
            signaled_today: Mutex::new(HashSet::from(["INFY".to_string()])),
        };
        let candidates = vec![
            candidate("RELIANCE"),
            candidate("INFY"),
            candidate("SBIN"),
        ];
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let survivors = DuplicateChecker::filter(candidates, today, &trades, &signals)
            .await
            .unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].symbol, "SBIN");
    }
}
