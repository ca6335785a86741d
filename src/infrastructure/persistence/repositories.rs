//! `SqliteRepositories`: one SQLite-backed struct implementing every
//! `domain::repositories` trait (§10.4). Nested domain types (`FinalSignal`,
//! `RegimeClassification`) are stored as a `payload_json` blob alongside a
//! handful of indexed columns -- the pipeline never queries into the blob,
//! only by symbol/date/status, so there is no need to normalize every field
//! into its own column.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::domain::circuit::CircuitState;
use crate::domain::regime::RegimeClassification;
use crate::domain::repositories::{
    AdaptationLogRepository, CircuitBreakerLogRepository, EarningsCalendarRepository,
    NewsSentimentRepository, PersistedSignal, RegimeRepository, SignalActionRepository,
    SignalRepository, StrategyPerformanceRepository, TradeRepository, UserConfigRepository,
    WatchlistRepository,
};
use crate::domain::sentiment::{SentimentLabel, SymbolSentiment};
use crate::domain::signal::{FinalSignal, SignalStatus, StrategyName};
use crate::domain::trade::{ClosedTrade, ExitReason, Trade};

#[derive(Clone)]
pub struct SqliteRepositories {
    pool: SqlitePool,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

#[async_trait]
impl SignalRepository for SqliteRepositories {
    async fn insert_signal(&self, signal: &FinalSignal) -> anyhow::Result<i64> {
        let payload = serde_json::to_string(signal)?;
        let symbol = &signal.ranked.candidate.symbol;
        let strategy = signal.ranked.candidate.strategy.as_str();
        let trade_date = signal.ranked.candidate.generated_at.date_naive();

        let row = sqlx::query(
            r#"
            INSERT INTO signals (symbol, strategy, status, trade_date, generated_at, expires_at, payload_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(symbol)
        .bind(strategy)
        .bind(SignalStatus::Sent.as_str())
        .bind(trade_date)
        .bind(signal.ranked.candidate.generated_at)
        .bind(signal.expires_at)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("id")?)
    }

    async fn update_signal_status(&self, id: i64, status: SignalStatus) -> anyhow::Result<()> {
        sqlx::query("UPDATE signals SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_active_signals(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PersistedSignal>> {
        let rows = sqlx::query(
            "SELECT id, status, payload_json FROM signals WHERE trade_date = ? AND status = ? AND expires_at > ?",
        )
        .bind(date)
        .bind(SignalStatus::Sent.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_persisted_signal).collect()
    }

    async fn get_signal(&self, id: i64) -> anyhow::Result<Option<PersistedSignal>> {
        let row = sqlx::query("SELECT id, status, payload_json FROM signals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_persisted_signal).transpose()
    }

    async fn expire_stale_signals(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE signals SET status = ? WHERE status = ? AND expires_at <= ?")
            .bind(SignalStatus::Expired.as_str())
            .bind(SignalStatus::Sent.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn has_signal_for_stock_today(&self, symbol: &str, date: NaiveDate) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM signals WHERE symbol = ? AND trade_date = ?")
            .bind(symbol)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? > 0)
    }
}

fn row_to_persisted_signal(row: sqlx::sqlite::SqliteRow) -> anyhow::Result<PersistedSignal> {
    let id: i64 = row.try_get("id")?;
    let status_str: String = row.try_get("status")?;
    let payload: String = row.try_get("payload_json")?;
    let signal: FinalSignal = serde_json::from_str(&payload)?;
    let status: SignalStatus = status_str.parse()?;
    Ok(PersistedSignal { id, signal, status })
}

#[async_trait]
impl TradeRepository for SqliteRepositories {
    async fn insert_trade(&self, trade: &Trade) -> anyhow::Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO trades (signal_id, symbol, entry_price, stop_loss, target1, target2, quantity, taken_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(trade.signal_id)
        .bind(&trade.symbol)
        .bind(trade.entry_price.to_string())
        .bind(trade.stop_loss.to_string())
        .bind(trade.target1.to_string())
        .bind(trade.target2.to_string())
        .bind(trade.quantity)
        .bind(trade.taken_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get::<i64, _>("id")?)
    }

    async fn close_trade(
        &self,
        id: i64,
        exit_price: Decimal,
        pnl_abs: Decimal,
        pnl_pct: Decimal,
        reason: ExitReason,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE trades
            SET exit_price = ?, exit_reason = ?, realized_pnl_abs = ?, realized_pnl_pct = ?, exit_at = ?
            WHERE id = ?
            "#,
        )
        .bind(exit_price.to_string())
        .bind(reason.as_str())
        .bind(pnl_abs.to_string())
        .bind(pnl_pct.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_active_trades(&self) -> anyhow::Result<Vec<Trade>> {
        let rows = sqlx::query(
            "SELECT id, signal_id, symbol, entry_price, stop_loss, target1, target2, quantity, taken_at FROM trades WHERE exit_at IS NULL ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_open_trade).collect()
    }

    async fn get_active_trade_count(&self) -> anyhow::Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM trades WHERE exit_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as usize)
    }

    async fn has_active_trade(&self, symbol: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM trades WHERE symbol = ? AND exit_at IS NULL")
            .bind(symbol)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? > 0)
    }
}

fn row_to_open_trade(row: sqlx::sqlite::SqliteRow) -> anyhow::Result<Trade> {
    Ok(Trade {
        id: row.try_get("id")?,
        signal_id: row.try_get("signal_id")?,
        symbol: row.try_get("symbol")?,
        entry_price: dec(&row.try_get::<String, _>("entry_price")?),
        stop_loss: dec(&row.try_get::<String, _>("stop_loss")?),
        target1: dec(&row.try_get::<String, _>("target1")?),
        target2: dec(&row.try_get::<String, _>("target2")?),
        quantity: row.try_get("quantity")?,
        taken_at: row.try_get("taken_at")?,
        closed: None,
    })
}

const KEY_TOTAL_CAPITAL: &str = "total_capital";

fn allocation_key(strategy: StrategyName) -> String {
    format!("allocation_{}", strategy.as_str())
}

fn paused_key(strategy: StrategyName) -> String {
    format!("paused_{}", strategy.as_str())
}

#[async_trait]
impl UserConfigRepository for SqliteRepositories {
    async fn get_total_capital(&self) -> anyhow::Result<Decimal> {
        let row = sqlx::query("SELECT value FROM user_config WHERE key = ?")
            .bind(KEY_TOTAL_CAPITAL)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| dec(&r.get::<String, _>("value"))).unwrap_or_default())
    }

    async fn set_total_capital(&self, capital: Decimal) -> anyhow::Result<()> {
        upsert_config(&self.pool, KEY_TOTAL_CAPITAL, &capital.to_string()).await
    }

    async fn get_strategy_allocation(&self, strategy: StrategyName) -> anyhow::Result<Decimal> {
        let key = allocation_key(strategy);
        let row = sqlx::query("SELECT value FROM user_config WHERE key = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| dec(&r.get::<String, _>("value"))).unwrap_or_default())
    }

    async fn set_strategy_allocation(&self, strategy: StrategyName, pct: Decimal) -> anyhow::Result<()> {
        upsert_config(&self.pool, &allocation_key(strategy), &pct.to_string()).await
    }

    async fn is_strategy_paused(&self, strategy: StrategyName) -> anyhow::Result<bool> {
        let key = paused_key(strategy);
        let row = sqlx::query("SELECT value FROM user_config WHERE key = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value") == "true").unwrap_or(false))
    }

    async fn set_strategy_paused(&self, strategy: StrategyName, paused: bool) -> anyhow::Result<()> {
        upsert_config(&self.pool, &paused_key(strategy), if paused { "true" } else { "false" }).await
    }
}

async fn upsert_config(pool: &SqlitePool, key: &str, value: &str) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO user_config (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
impl CircuitBreakerLogRepository for SqliteRepositories {
    async fn record_trip(&self, at: DateTime<Utc>, sl_count: u32) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO circuit_breaker_log (tripped_at, sl_count) VALUES (?, ?)")
            .bind(at)
            .bind(sl_count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_today(&self, date: NaiveDate) -> anyhow::Result<CircuitState> {
        let row = sqlx::query(
            "SELECT sl_count, triggered_at, manual_override FROM circuit_breaker_state WHERE trade_date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => CircuitState {
                sl_count: row.try_get::<i64, _>("sl_count")? as u32,
                triggered_at: row.try_get("triggered_at")?,
                manual_override: row.try_get("manual_override")?,
            },
            None => CircuitState::default(),
        })
    }

    async fn save_today(&self, date: NaiveDate, state: CircuitState) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO circuit_breaker_state (trade_date, sl_count, triggered_at, manual_override)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(trade_date) DO UPDATE SET
                sl_count = excluded.sl_count,
                triggered_at = excluded.triggered_at,
                manual_override = excluded.manual_override
            "#,
        )
        .bind(date)
        .bind(state.sl_count)
        .bind(state.triggered_at)
        .bind(state.manual_override)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AdaptationLogRepository for SqliteRepositories {
    async fn record_transition(
        &self,
        strategy: StrategyName,
        at: DateTime<Utc>,
        to_level: &str,
        reason: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO adaptation_log (strategy, at, to_level, reason) VALUES (?, ?, ?, ?)")
            .bind(strategy.as_str())
            .bind(at)
            .bind(to_level)
            .bind(reason)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NewsSentimentRepository for SqliteRepositories {
    async fn save(&self, sentiment: &SymbolSentiment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news_sentiment (symbol, trade_date, label, score, headline, earnings_today, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(symbol, trade_date) DO UPDATE SET
                label = excluded.label,
                score = excluded.score,
                headline = excluded.headline,
                earnings_today = excluded.earnings_today,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&sentiment.symbol)
        .bind(sentiment.fetched_at.date_naive())
        .bind(sentiment.label.to_string())
        .bind(sentiment.score)
        .bind(&sentiment.headline)
        .bind(sentiment.earnings_today)
        .bind(sentiment.fetched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, symbol: &str, date: NaiveDate) -> anyhow::Result<Option<SymbolSentiment>> {
        let row = sqlx::query(
            "SELECT symbol, label, score, headline, earnings_today, fetched_at FROM news_sentiment WHERE symbol = ? AND trade_date = ?",
        )
        .bind(symbol)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_sentiment).transpose()
    }

    async fn get_all_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<SymbolSentiment>> {
        let rows = sqlx::query(
            "SELECT symbol, label, score, headline, earnings_today, fetched_at FROM news_sentiment WHERE trade_date = ?",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_sentiment).collect()
    }
}

fn row_to_sentiment(row: sqlx::sqlite::SqliteRow) -> anyhow::Result<SymbolSentiment> {
    let label_str: String = row.try_get("label")?;
    let label = match label_str.as_str() {
        "Strong Negative" => SentimentLabel::StrongNegative,
        "Mild Negative" => SentimentLabel::MildNegative,
        "Positive" => SentimentLabel::Positive,
        "No News" => SentimentLabel::NoNews,
        _ => SentimentLabel::Neutral,
    };
    Ok(SymbolSentiment {
        symbol: row.try_get("symbol")?,
        label,
        score: row.try_get("score")?,
        headline: row.try_get("headline")?,
        earnings_today: row.try_get("earnings_today")?,
        fetched_at: row.try_get("fetched_at")?,
    })
}

#[async_trait]
impl EarningsCalendarRepository for SqliteRepositories {
    async fn has_earnings_today(&self, symbol: &str, date: NaiveDate) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM earnings_calendar WHERE symbol = ? AND earnings_date = ?")
            .bind(symbol)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? > 0)
    }
}

#[async_trait]
impl RegimeRepository for SqliteRepositories {
    async fn save_classification(&self, c: &RegimeClassification) -> anyhow::Result<()> {
        let payload = serde_json::to_string(c)?;
        sqlx::query("INSERT INTO regime_classifications (classified_at, payload_json) VALUES (?, ?)")
            .bind(c.classified_at)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_latest(&self) -> anyhow::Result<Option<RegimeClassification>> {
        let row = sqlx::query(
            "SELECT payload_json FROM regime_classifications ORDER BY classified_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => {
                let payload: String = row.try_get("payload_json")?;
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SignalActionRepository for SqliteRepositories {
    async fn record_action(&self, signal_id: i64, action: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO signal_actions (signal_id, action, at) VALUES (?, ?, ?)")
            .bind(signal_id)
            .bind(action)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WatchlistRepository for SqliteRepositories {
    async fn add(&self, symbol: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO watchlist (symbol) VALUES (?) ON CONFLICT(symbol) DO NOTHING")
            .bind(symbol)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, symbol: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM watchlist WHERE symbol = ?")
            .bind(symbol)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT symbol FROM watchlist ORDER BY added_at ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| Ok(r.try_get("symbol")?)).collect()
    }
}

#[async_trait]
impl StrategyPerformanceRepository for SqliteRepositories {
    async fn record_outcome(&self, strategy: StrategyName, won: bool, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO strategy_performance (strategy, won, at) VALUES (?, ?, ?)")
            .bind(strategy.as_str())
            .bind(won)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rolling_win_rate_pct(&self, strategy: StrategyName, days: u32) -> anyhow::Result<Decimal> {
        let cutoff = Utc::now() - chrono::Duration::days(days as i64);
        let row = sqlx::query(
            "SELECT COUNT(*) as total, SUM(CASE WHEN won THEN 1 ELSE 0 END) as wins FROM strategy_performance WHERE strategy = ? AND at >= ?",
        )
        .bind(strategy.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        if total == 0 {
            return Ok(Decimal::ZERO);
        }
        let wins: i64 = row.try_get::<Option<i64>, _>("wins")?.unwrap_or(0);
        Ok(Decimal::from(wins) / Decimal::from(total) * Decimal::from(100))
    }
}
