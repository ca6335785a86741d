//! `SentimentProvider` backed by polling configured RSS feeds and scoring
//! each headline with `SentimentAnalyzer` (§4.8, §6). Grounded on
//! `infrastructure::news::rss`'s `Channel::read_from` fetch pattern, adapted
//! from a push-subscription poller into a pull-on-demand batch fetch (the
//! pipeline's `NewsSentimentStage` calls `fetch_sentiment` once per cycle
//! rather than subscribing to a stream).

use std::io::Cursor;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rss::Channel;
use tracing::warn;

use crate::domain::sentiment::{SentimentLabel, SentimentProvider, SymbolSentiment};
use crate::infrastructure::sentiment::analyzer::SentimentAnalyzer;

pub struct RssSentimentProvider {
    feed_urls: Vec<String>,
    client: Client,
    analyzer: SentimentAnalyzer,
    strong_negative_threshold: f64,
}

impl RssSentimentProvider {
    pub fn new(feed_urls: Vec<String>, strong_negative_threshold: f64) -> Self {
        Self {
            feed_urls,
            client: Client::new(),
            analyzer: SentimentAnalyzer::new(),
            strong_negative_threshold,
        }
    }

    async fn fetch_headlines(&self, url: &str) -> anyhow::Result<Vec<(String, String)>> {
        let bytes = self.client.get(url).send().await?.bytes().await?;
        let channel = Channel::read_from(Cursor::new(bytes))?;
        Ok(channel
            .items()
            .iter()
            .map(|item| {
                (
                    item.title().unwrap_or_default().to_string(),
                    item.description().unwrap_or_default().to_string(),
                )
            })
            .collect())
    }
}

#[async_trait]
impl SentimentProvider for RssSentimentProvider {
    async fn fetch_sentiment(&self, symbols: &[String]) -> anyhow::Result<Vec<SymbolSentiment>> {
        let mut headlines = Vec::new();
        for url in &self.feed_urls {
            match self.fetch_headlines(url).await {
                Ok(items) => headlines.extend(items),
                Err(err) => warn!(%url, %err, "failed to fetch RSS feed; skipping"),
            }
        }

        let now = Utc::now();
        let mut results = Vec::new();
        for symbol in symbols {
            let matched: Vec<&(String, String)> = headlines
                .iter()
                .filter(|(title, _)| title.to_uppercase().contains(symbol.as_str()))
                .collect();
            if matched.is_empty() {
                continue;
            }

            let (best_title, best_content) = matched
                .iter()
                .map(|(t, c)| (t, c, self.analyzer.analyze_news(t, c)))
                .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(t, c, _)| (t.clone(), c.clone()))
                .expect("matched is non-empty");

            let score = self.analyzer.analyze_news(&best_title, &best_content);
            results.push(SymbolSentiment {
                symbol: symbol.clone(),
                label: SentimentLabel::from_score(score, self.strong_negative_threshold),
                score,
                headline: Some(best_title),
                earnings_today: false,
                fetched_at: now,
            });
        }
        Ok(results)
    }
}
