use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-wide kill switch state: how many SL-hit exits have occurred today, and
/// whether the breaker has tripped. `sl_count` may only increase on SL-hit exits
/// and resets at daily session start (§3 invariants).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CircuitState {
    pub sl_count: u32,
    pub triggered_at: Option<DateTime<Utc>>,
    pub manual_override: bool,
}

impl CircuitState {
    pub fn is_active(&self, limit: u32) -> bool {
        !self.manual_override && self.sl_count >= limit
    }
}
