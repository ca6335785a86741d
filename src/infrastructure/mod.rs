// Broker transport (mock adapter over the BrokerTransport port)
pub mod broker;

// SQLite-backed repositories implementing domain::repositories traits
pub mod persistence;

// Sentiment provider (RSS + VADER) and historical fallback provider
pub mod sentiment;
pub mod historical;

// NSE trading calendar and session-phase helpers
pub mod calendar;

// Shared retried HTTP client factory
pub mod http;

// Prometheus metrics registry
pub mod observability;

// Chat gateway (mock/console adapter over the ChatGateway port)
pub mod chat;
