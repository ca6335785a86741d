use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradeable symbol, created at startup from the constituent list cross-referenced
/// against the broker instrument master. Immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub broker_token: String,
    pub exchange: String,
    pub lot_size: u32,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        broker_token: impl Into<String>,
        exchange: impl Into<String>,
        lot_size: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            broker_token: broker_token.into(),
            exchange: exchange.into(),
            lot_size,
        }
    }
}

/// Prior-day reference data, loaded once during pre-open and immutable after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalReference {
    pub prev_close: Decimal,
    pub prev_high: Decimal,
    /// 20-session average daily volume.
    pub avg_daily_volume: Decimal,
}
