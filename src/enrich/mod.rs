//! Article enrichment collaborators
//!
//! The crawler stores a sentiment label and a keyword list with every article.
//! Both come from pluggable implementations; the defaults here need no model.

mod keywords;

pub use keywords::FrequencyKeywords;

use serde::Serialize;

/// Sentiment label plus class probabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentScore {
    pub label: String,
    pub confidence: f64,
    pub prob_negative: f64,
    pub prob_neutral: f64,
    pub prob_positive: f64,
}

impl SentimentScore {
    pub fn neutral() -> Self {
        Self {
            label: "neutral".to_string(),
            confidence: 1.0 / 3.0,
            prob_negative: 1.0 / 3.0,
            prob_neutral: 1.0 / 3.0,
            prob_positive: 1.0 / 3.0,
        }
    }
}

/// Assigns a sentiment to article text
pub trait Tagger: Send + Sync {
    fn tag(&self, text: &str) -> SentimentScore;
}

/// Produces a comma-separated keyword list for an article
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, title: &str, content: &str) -> String;
}

/// Tagger that labels everything neutral with uniform probabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralTagger;

impl Tagger for NeutralTagger {
    fn tag(&self, _text: &str) -> SentimentScore {
        SentimentScore::neutral()
    }
}
