use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running high/low for `[09:15, 09:45)` IST. Once `locked`, further `widen` calls
/// are no-ops, and `range_size_pct` is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningRange {
    pub high: Decimal,
    pub low: Decimal,
    pub locked: bool,
    pub range_size_pct: Option<Decimal>,
}

impl Default for OpeningRange {
    fn default() -> Self {
        Self {
            high: Decimal::ZERO,
            low: Decimal::ZERO,
            locked: false,
            range_size_pct: None,
        }
    }
}

impl OpeningRange {
    /// Widens the range by `max(high)`, `min(low)`. No-op once locked.
    pub fn widen(&mut self, high: Decimal, low: Decimal) {
        if self.locked {
            return;
        }
        if self.low.is_zero() || low < self.low {
            self.low = low;
        }
        if high > self.high {
            self.high = high;
        }
    }

    /// Locks the range and computes `range_size_pct = (high − low) / low × 100`.
    /// Only applies to ranges with `low > 0`; a zero-low range never locks.
    pub fn lock(&mut self) {
        if self.locked || self.low.is_zero() {
            return;
        }
        self.locked = true;
        self.range_size_pct = Some((self.high - self.low) / self.low * Decimal::from(100));
    }
}
