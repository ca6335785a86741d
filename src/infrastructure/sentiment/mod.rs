pub mod analyzer;
pub mod rss_provider;

pub use rss_provider::RssSentimentProvider;
