use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// The named time slice of a trading day. A single source of truth: both the
/// strategy set (§4.2) and the pipeline gate (§4.13) read the same `StrategyPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyPhase {
    /// Before 09:15 IST.
    PreMarket,
    /// 09:15–09:30 IST.
    Opening,
    /// 09:30–09:45 IST.
    EntryWindow,
    /// 09:45–14:30 IST.
    Continuous,
    /// 14:30–15:30 IST: no new signals, exits still run.
    WindDown,
    /// After 15:30 IST.
    PostMarket,
}

impl StrategyPhase {
    pub fn market_open() -> NaiveTime {
        time(9, 15)
    }
    pub fn gap_scan_end() -> NaiveTime {
        time(9, 30)
    }
    pub fn entry_window_end() -> NaiveTime {
        time(9, 45)
    }
    pub fn new_signal_cutoff() -> NaiveTime {
        time(14, 30)
    }
    pub fn market_close() -> NaiveTime {
        time(15, 30)
    }

    /// Maps a wall-clock IST time to the current phase.
    pub fn from_ist_time(t: NaiveTime) -> Self {
        if t < Self::market_open() {
            StrategyPhase::PreMarket
        } else if t < Self::gap_scan_end() {
            StrategyPhase::Opening
        } else if t < Self::entry_window_end() {
            StrategyPhase::EntryWindow
        } else if t < Self::new_signal_cutoff() {
            StrategyPhase::Continuous
        } else if t < Self::market_close() {
            StrategyPhase::WindDown
        } else {
            StrategyPhase::PostMarket
        }
    }

    /// Phases during which the signal-producing stages may run at all.
    pub fn accepts_new_signals(self) -> bool {
        matches!(
            self,
            StrategyPhase::Opening | StrategyPhase::EntryWindow | StrategyPhase::Continuous
        )
    }
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid hour/minute")
}
