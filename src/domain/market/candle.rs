use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV aggregate over a 15-minute bucket, aligned to `floor(minute/15)*15`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle15m {
    pub bucket_start: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl Candle15m {
    pub fn open_at(timestamp: DateTime<Utc>, price: Decimal, volume: i64) -> Self {
        Self {
            bucket_start: bucket_start(timestamp),
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    pub fn apply(&mut self, price: Decimal, delta_volume: i64) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
        self.volume += delta_volume;
    }
}

/// `floor(minute/15)*15`, truncated to the minute (seconds/nanos zeroed).
pub fn bucket_start(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let bucket_minute = (timestamp.minute() / 15) * 15;
    timestamp
        .with_minute(bucket_minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}
