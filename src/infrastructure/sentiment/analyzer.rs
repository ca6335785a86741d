//! Local VADER sentiment scoring with a financial-keyword boost, reused from
//! the crypto-news analyzer for Indian-equity headlines: the lexicon is
//! asset-agnostic English finance vocabulary ("surge", "crash", "earnings
//! beat" vs. "miss"), so it transfers without change.

use vader_sentiment::SentimentIntensityAnalyzer;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("record high", 0.4),
    ("all-time high", 0.5),
    ("bullish", 0.5),
    ("breakout", 0.3),
    ("upgrade", 0.3),
    ("beats estimates", 0.4),
    ("beat estimates", 0.4),
    ("strong guidance", 0.3),
    ("order win", 0.3),
    ("expansion", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("crashes", -0.5),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("slump", -0.4),
    ("bearish", -0.5),
    ("downgrade", -0.4),
    ("misses estimates", -0.4),
    ("miss estimates", -0.4),
    ("probe", -0.4),
    ("raid", -0.5),
    ("fraud", -0.6),
    ("default", -0.5),
    ("resignation", -0.3),
    ("sell-off", -0.4),
    ("selloff", -0.4),
];

pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn financial_boost(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let mut boost = 0.0;
        for (keyword, score) in BULLISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score;
            }
        }
        for (keyword, score) in BEARISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score;
            }
        }
        boost
    }

    /// Compound VADER score plus financial boost, clamped to `[-1, 1]`.
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        let vader_score = scores["compound"];
        (vader_score + self.financial_boost(text) * 0.5).clamp(-1.0, 1.0)
    }

    /// Title-weighted (70/30) combination of title and body sentiment.
    pub fn analyze_news(&self, title: &str, content: &str) -> f64 {
        self.analyze(title) * 0.7 + self.analyze(content) * 0.3
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_headline_scores_positive() {
        let analyzer = SentimentAnalyzer::new();
        let score = analyzer.analyze("Reliance surges to record high on strong guidance");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn bearish_headline_scores_negative() {
        let analyzer = SentimentAnalyzer::new();
        let score = analyzer.analyze("Adani stock crashes after fraud probe launched");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn empty_text_is_neutral() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.analyze(""), 0.0);
    }
}
