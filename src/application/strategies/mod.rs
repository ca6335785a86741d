pub mod gap_and_go;
pub mod orb;
pub mod traits;
pub mod vwap_reversal;

pub use gap_and_go::GapAndGoStrategy;
pub use orb::OrbStrategy;
pub use traits::{Strategy, StrategyInputs};
pub use vwap_reversal::VwapReversalStrategy;
