// Market data domain: instruments, ticks, opening range, VWAP, candles, phase
pub mod market;

// Signal lifecycle: candidates, ranking, final signals
pub mod signal;

// Trade lifecycle and trailing-stop state
pub mod trade;

// Market regime classification
pub mod regime;

// NSE trading-day calendar
pub mod calendar;

// Circuit breaker state
pub mod circuit;

// News sentiment types and provider port
pub mod sentiment;

// Port interfaces (broker, chat, historical fallback)
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
