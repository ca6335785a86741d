// Risk management and position control modules
pub mod adaptive_manager;
pub mod circuit_breaker;
pub mod composite_scorer;
pub mod confirmation_detector;
pub mod duplicate_checker;
pub mod exit_monitor;
pub mod news_sentiment_gate;
pub mod ranker;
pub mod regime_classifier;
pub mod risk_sizer;

pub use adaptive_manager::{AdaptiveLevel, AdaptiveManager};
pub use circuit_breaker::CircuitBreaker;
pub use composite_scorer::CompositeScorer;
pub use confirmation_detector::{ConfirmationDetector, ConfirmedCandidate};
pub use duplicate_checker::DuplicateChecker;
pub use exit_monitor::{ExitAlert, ExitMonitor};
pub use news_sentiment_gate::NewsSentimentGate;
pub use ranker::Ranker;
pub use regime_classifier::{RegimeClassifier, RegimeClassifierWeights, RegimeInputs};
pub use risk_sizer::RiskSizer;
