// Scan agent and scheduled jobs
pub mod agents;

// Application startup wiring
pub mod bootstrap;

// Chat command surface
pub mod chat;

// The async-safe market data store
pub mod market_data;

// The stage pipeline and scan context
pub mod pipeline;

// Signal-quality and exit state machines: dedup, confirmation, scoring,
// adaptive throttling, regime, news gate, ranking, risk sizing, exit monitor,
// circuit breaker
pub mod risk_management;

// The three long-only strategies
pub mod strategies;

// System orchestrator (startup/reset/shutdown/crash recovery)
pub mod system;
