//! SQLite connection pool and schema bootstrap (§10.4).

use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to connect to SQLite database")?;

        info!(db_url, "connected to database");

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                strategy TEXT NOT NULL,
                status TEXT NOT NULL,
                trade_date DATE NOT NULL,
                generated_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                payload_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create signals table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_signals_symbol_date ON signals (symbol, trade_date);")
            .execute(&mut *conn)
            .await
            .context("failed to create signals index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                signal_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                stop_loss TEXT NOT NULL,
                target1 TEXT NOT NULL,
                target2 TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                taken_at DATETIME NOT NULL,
                exit_price TEXT,
                exit_reason TEXT,
                realized_pnl_abs TEXT,
                realized_pnl_pct TEXT,
                exit_at DATETIME
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create trades table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_open ON trades (symbol) WHERE exit_at IS NULL;")
            .execute(&mut *conn)
            .await
            .context("failed to create trades index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create user_config table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS circuit_breaker_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tripped_at DATETIME NOT NULL,
                sl_count INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create circuit_breaker_log table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS circuit_breaker_state (
                trade_date DATE PRIMARY KEY,
                sl_count INTEGER NOT NULL,
                triggered_at DATETIME,
                manual_override BOOLEAN NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create circuit_breaker_state table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS adaptation_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy TEXT NOT NULL,
                at DATETIME NOT NULL,
                to_level TEXT NOT NULL,
                reason TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create adaptation_log table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_sentiment (
                symbol TEXT NOT NULL,
                trade_date DATE NOT NULL,
                label TEXT NOT NULL,
                score REAL NOT NULL,
                headline TEXT,
                earnings_today BOOLEAN NOT NULL,
                fetched_at DATETIME NOT NULL,
                PRIMARY KEY (symbol, trade_date)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create news_sentiment table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS earnings_calendar (
                symbol TEXT NOT NULL,
                earnings_date DATE NOT NULL,
                PRIMARY KEY (symbol, earnings_date)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create earnings_calendar table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regime_classifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                classified_at DATETIME NOT NULL,
                payload_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create regime_classifications table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signal_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                signal_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                at DATETIME NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create signal_actions table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS watchlist (
                symbol TEXT PRIMARY KEY,
                added_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create watchlist table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS strategy_performance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy TEXT NOT NULL,
                won BOOLEAN NOT NULL,
                at DATETIME NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create strategy_performance table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_strategy_performance_lookup ON strategy_performance (strategy, at);")
            .execute(&mut *conn)
            .await
            .context("failed to create strategy_performance index")?;

        info!("database schema initialized");
        Ok(())
    }
}
