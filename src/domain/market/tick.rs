use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The latest trade snapshot for a symbol. Each update from the broker *replaces*
/// the previous tick in full; `cum_volume` is a running total supplied by the broker,
/// never accumulated locally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub ltp: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub cum_volume: i64,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(
        ltp: Decimal,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        cum_volume: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            ltp,
            open,
            high,
            low,
            close,
            cum_volume,
            timestamp,
        }
    }

    /// `gap% = (open − prevClose) / prevClose × 100`.
    pub fn gap_pct(&self, prev_close: Decimal) -> Decimal {
        if prev_close.is_zero() {
            return Decimal::ZERO;
        }
        (self.open - prev_close) / prev_close * Decimal::from(100)
    }
}

impl From<crate::domain::ports::BrokerTick> for Tick {
    fn from(tick: crate::domain::ports::BrokerTick) -> Self {
        Self {
            ltp: tick.ltp,
            open: tick.open,
            high: tick.high,
            low: tick.low,
            close: tick.close,
            cum_volume: tick.cum_volume,
            timestamp: tick.timestamp,
        }
    }
}
