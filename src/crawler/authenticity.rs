//! Article authenticity filter
//!
//! Rejects pages that made it through link discovery but are not real news
//! articles: legal pages, galleries, stubs. Domains in the relaxed trust tier
//! only need a single sentence terminator.

use crate::config::TrustConfig;
use crate::crawler::classifier::EXCLUDE_KEYWORDS;
use crate::url::{domain_matches, extract_domain};
use url::Url;

/// Minimum characters of article text
pub const MIN_ARTICLE_CHARS: usize = 200;

/// Minimum characters of a trimmed title
pub const MIN_TITLE_CHARS: usize = 5;

const TERMINATORS: &[char] = &['.', '!', '?'];

#[derive(Debug, Clone, Default)]
pub struct AuthenticityFilter {
    relaxed_domains: Vec<String>,
}

impl AuthenticityFilter {
    pub fn new(relaxed_domains: Vec<String>) -> Self {
        Self { relaxed_domains }
    }

    pub fn from_config(config: &TrustConfig) -> Self {
        Self::new(config.relaxed_domains.clone())
    }

    /// True if `url` belongs to the relaxed trust tier
    pub fn is_relaxed(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url).ok().and_then(|u| extract_domain(&u)) else {
            return false;
        };
        self.relaxed_domains.iter().any(|pattern| {
            domain_matches(pattern, &host) || host.ends_with(&format!(".{}", pattern))
        })
    }

    pub fn is_authentic(&self, title: &str, url: &str, content: &str) -> bool {
        let title = title.trim();
        if content.chars().count() < MIN_ARTICLE_CHARS
            || title.chars().count() < MIN_TITLE_CHARS
        {
            return false;
        }

        if self.is_relaxed(url) {
            return count_terminators(title) + count_terminators(content) >= 1;
        }

        let head = format!("{} {}", title, url).to_lowercase();
        if EXCLUDE_KEYWORDS.iter().any(|k| head.contains(k)) {
            tracing::debug!("Rejecting {}: excluded keyword", url);
            return false;
        }

        count_terminators(title) + count_terminators(url) + count_terminators(content) >= 2
    }
}

fn count_terminators(text: &str) -> usize {
    text.chars().filter(|c| TERMINATORS.contains(c)).count()
}
