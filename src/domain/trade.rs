use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why an active trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    SlHit,
    T1Hit,
    T2Hit,
    TrailingSl,
    TimeExit,
    ManualExit,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::SlHit => "sl_hit",
            ExitReason::T1Hit => "t1_hit",
            ExitReason::T2Hit => "t2_hit",
            ExitReason::TrailingSl => "trailing_sl",
            ExitReason::TimeExit => "time_exit",
            ExitReason::ManualExit => "manual_exit",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted signal that became a live position, from `TAKEN` through exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub signal_id: i64,
    pub symbol: String,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub target1: Decimal,
    pub target2: Decimal,
    pub quantity: i64,
    pub taken_at: DateTime<Utc>,
    pub closed: Option<ClosedTrade>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub exit_price: Decimal,
    pub exit_reason: ExitReason,
    pub realized_pnl_abs: Decimal,
    pub realized_pnl_pct: Decimal,
    pub exit_at: DateTime<Utc>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }

    /// `(exit − entry) / entry × 100`.
    pub fn pnl_pct(&self, exit_price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (exit_price - self.entry_price) / self.entry_price * Decimal::from(100)
    }

    pub fn pnl_abs(&self, exit_price: Decimal) -> Decimal {
        (exit_price - self.entry_price) * Decimal::from(self.quantity)
    }
}

/// Per-active-trade trailing stop state, owned outright by `ExitMonitor`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailingStopState {
    pub original_sl: Decimal,
    pub current_sl: Decimal,
    pub highest_price: Decimal,
    pub breakeven_triggered: bool,
    pub trailing_active: bool,
    pub t1_alerted: bool,
    pub sl_approaching_cooldown_until: Option<DateTime<Utc>>,
    pub near_t2_alerted: bool,
}

impl TrailingStopState {
    pub fn new(entry_price: Decimal, stop_loss: Decimal) -> Self {
        Self {
            original_sl: stop_loss,
            current_sl: stop_loss,
            highest_price: entry_price,
            breakeven_triggered: false,
            trailing_active: false,
            t1_alerted: false,
            sl_approaching_cooldown_until: None,
            near_t2_alerted: false,
        }
    }
}
