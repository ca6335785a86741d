use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running volume-weighted average price since session start. Undefined (`None`) until
/// `cumulative_volume > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapState {
    pub cumulative_price_volume: Decimal,
    pub cumulative_volume: Decimal,
}

impl Default for VwapState {
    fn default() -> Self {
        Self {
            cumulative_price_volume: Decimal::ZERO,
            cumulative_volume: Decimal::ZERO,
        }
    }
}

impl VwapState {
    pub fn accumulate(&mut self, price: Decimal, delta_volume: Decimal) {
        self.cumulative_price_volume += price * delta_volume;
        self.cumulative_volume += delta_volume;
    }

    pub fn current(&self) -> Option<Decimal> {
        if self.cumulative_volume.is_zero() {
            None
        } else {
            Some(self.cumulative_price_volume / self.cumulative_volume)
        }
    }
}
