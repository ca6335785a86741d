//! Repository traits over the persisted row store (§6, §10.4). One trait per table
//! group; a single SQLite-backed struct implements all of them
//! (`infrastructure::persistence::SqliteRepositories`).
//!
//! # Design
//!
//! Following the repository pattern, business logic (the pipeline stages) depends
//! only on these traits, never on `sqlx` types directly.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::circuit::CircuitState;
use crate::domain::regime::RegimeClassification;
use crate::domain::sentiment::SymbolSentiment;
use crate::domain::signal::{FinalSignal, SignalStatus, StrategyName};
use crate::domain::trade::{ExitReason, Trade};

#[derive(Debug, Clone)]
pub struct PersistedSignal {
    pub id: i64,
    pub signal: FinalSignal,
    pub status: SignalStatus,
}

/// Persists and queries `FinalSignal`s (the `signals` table).
#[async_trait]
pub trait SignalRepository: Send + Sync {
    async fn insert_signal(&self, signal: &FinalSignal) -> anyhow::Result<i64>;
    async fn update_signal_status(&self, id: i64, status: SignalStatus) -> anyhow::Result<()>;
    async fn get_active_signals(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PersistedSignal>>;
    async fn get_signal(&self, id: i64) -> anyhow::Result<Option<PersistedSignal>>;
    /// Marks signals past `expires_at` as `Expired`; returns how many were updated.
    async fn expire_stale_signals(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
    async fn has_signal_for_stock_today(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> anyhow::Result<bool>;
}

/// Persists and queries `Trade`s (the `trades` table).
#[async_trait]
pub trait TradeRepository: Send + Sync {
    async fn insert_trade(&self, trade: &Trade) -> anyhow::Result<i64>;
    async fn close_trade(
        &self,
        id: i64,
        exit_price: Decimal,
        pnl_abs: Decimal,
        pnl_pct: Decimal,
        reason: ExitReason,
    ) -> anyhow::Result<()>;
    async fn get_active_trades(&self) -> anyhow::Result<Vec<Trade>>;
    async fn get_active_trade_count(&self) -> anyhow::Result<usize>;
    async fn has_active_trade(&self, symbol: &str) -> anyhow::Result<bool>;
}

/// Per-operator configuration mutated at runtime by chat commands
/// (`CAPITAL`, `ALLOCATE`, `PAUSE`/`RESUME`, ...); the `user_config` table.
#[async_trait]
pub trait UserConfigRepository: Send + Sync {
    async fn get_total_capital(&self) -> anyhow::Result<Decimal>;
    async fn set_total_capital(&self, capital: Decimal) -> anyhow::Result<()>;
    async fn get_strategy_allocation(&self, strategy: StrategyName) -> anyhow::Result<Decimal>;
    async fn set_strategy_allocation(
        &self,
        strategy: StrategyName,
        pct: Decimal,
    ) -> anyhow::Result<()>;
    async fn is_strategy_paused(&self, strategy: StrategyName) -> anyhow::Result<bool>;
    async fn set_strategy_paused(&self, strategy: StrategyName, paused: bool) -> anyhow::Result<()>;
}

/// Append-only log of circuit breaker trips (`circuit_breaker_log`) and today's
/// live `CircuitState`.
#[async_trait]
pub trait CircuitBreakerLogRepository: Send + Sync {
    async fn record_trip(&self, at: DateTime<Utc>, sl_count: u32) -> anyhow::Result<()>;
    async fn load_today(&self, date: NaiveDate) -> anyhow::Result<CircuitState>;
    async fn save_today(&self, date: NaiveDate, state: CircuitState) -> anyhow::Result<()>;
}

/// Append-only log of `AdaptiveManager` level transitions (`adaptation_log`).
#[async_trait]
pub trait AdaptationLogRepository: Send + Sync {
    async fn record_transition(
        &self,
        strategy: StrategyName,
        at: DateTime<Utc>,
        to_level: &str,
        reason: &str,
    ) -> anyhow::Result<()>;
}

/// Cached sentiment reads/writes (`news_sentiment`).
#[async_trait]
pub trait NewsSentimentRepository: Send + Sync {
    async fn save(&self, sentiment: &SymbolSentiment) -> anyhow::Result<()>;
    async fn get(&self, symbol: &str, date: NaiveDate) -> anyhow::Result<Option<SymbolSentiment>>;
    async fn get_all_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<SymbolSentiment>>;
}

/// Earnings blackout dates per symbol (`earnings_calendar`).
#[async_trait]
pub trait EarningsCalendarRepository: Send + Sync {
    async fn has_earnings_today(&self, symbol: &str, date: NaiveDate) -> anyhow::Result<bool>;
}

/// `regime_classifications` and `regime_performance`.
#[async_trait]
pub trait RegimeRepository: Send + Sync {
    async fn save_classification(&self, c: &RegimeClassification) -> anyhow::Result<()>;
    async fn get_latest(&self) -> anyhow::Result<Option<RegimeClassification>>;
}

/// `signal_actions`: an append-only audit log of TAKEN/SKIP/WATCH chat actions.
#[async_trait]
pub trait SignalActionRepository: Send + Sync {
    async fn record_action(
        &self,
        signal_id: i64,
        action: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

/// `watchlist`: symbols the operator asked to watch without taking.
#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    async fn add(&self, symbol: &str) -> anyhow::Result<()>;
    async fn remove(&self, symbol: &str) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<String>>;
}

/// `strategy_performance`: rolling win-rate bookkeeping consumed by `CompositeScorer`
/// and `AdaptiveManager`.
#[async_trait]
pub trait StrategyPerformanceRepository: Send + Sync {
    async fn record_outcome(
        &self,
        strategy: StrategyName,
        won: bool,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    /// Win rate over the trailing `days` calendar days, in `[0, 100]`.
    async fn rolling_win_rate_pct(
        &self,
        strategy: StrategyName,
        days: u32,
    ) -> anyhow::Result<Decimal>;
}
