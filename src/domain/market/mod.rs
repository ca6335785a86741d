//! Market data domain types: instruments, ticks, opening range, VWAP, and 15-minute candles.

pub mod candle;
pub mod instrument;
pub mod opening_range;
pub mod phase;
pub mod tick;
pub mod vwap;

pub use candle::Candle15m;
pub use instrument::{HistoricalReference, Instrument};
pub use opening_range::OpeningRange;
pub use phase::StrategyPhase;
pub use tick::Tick;
pub use vwap::VwapState;
