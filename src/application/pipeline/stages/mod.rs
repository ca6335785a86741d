pub mod adaptive_filter;
pub mod circuit_breaker_gate;
pub mod composite_scoring;
pub mod confirmation;
pub mod duplicate_filter;
pub mod exit_monitoring;
pub mod news_sentiment;
pub mod persist_and_deliver;
pub mod ranking;
pub mod regime_context;
pub mod risk_sizing;
pub mod strategy_eval;
pub mod user_config;

pub use adaptive_filter::AdaptiveFilterStage;
pub use circuit_breaker_gate::CircuitBreakerGateStage;
pub use composite_scoring::CompositeScoringStage;
pub use confirmation::ConfirmationStage;
pub use duplicate_filter::DuplicateFilterStage;
pub use exit_monitoring::ExitMonitoringStage;
pub use news_sentiment::NewsSentimentStage;
pub use persist_and_deliver::PersistAndDeliverStage;
pub use ranking::RankingStage;
pub use regime_context::RegimeContextStage;
pub use risk_sizing::RiskSizingStage;
pub use strategy_eval::StrategyEvalStage;
pub use user_config::UserConfigStage;
