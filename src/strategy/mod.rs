//! Per-source crawl strategies
//!
//! Every strategy implements [`CrawlStrategy`]: `discover` turns a source into
//! candidate links, `extract` turns one candidate into article text. [`harvest`]
//! drives both and applies the checks shared by every strategy (dedup, dead
//! links, per-source cap, minimum length, authenticity). Only the top candidates
//! up to the per-source cap are ever fetched.

mod dispatch;
mod html;
mod overrides;
mod rss;
mod sitemap;

pub use dispatch::CrawlEngine;
pub use html::HtmlStrategy;
pub use overrides::{ListingOverride, StrategyRegistry};
pub use rss::RssStrategy;
pub use sitemap::SitemapStrategy;

use crate::config::Config;
use crate::crawler::{
    fetch_text, ArticleLinkClassifier, AuthenticityFilter, ContentExtractor, FetchTimeouts,
    MIN_CONTENT_CHARS,
};
use crate::storage::{SharedStorage, SourceRecord};
use crate::tracker::LinkStatusStore;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeMap, HashSet};

/// A link a strategy proposes to harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    /// Text supplied by a feed entry, already stripped of markup
    pub feed_content: Option<String>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            feed_content: None,
        }
    }
}

/// An accepted article, ready for enrichment and storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedArticle {
    pub url: String,
    pub title: String,
    pub source: String,
    pub content: String,
}

/// Everything a strategy needs to talk to the network and the link cache
#[derive(Clone)]
pub struct CrawlContext {
    pub client: Client,
    pub timeouts: FetchTimeouts,
    pub extractor: ContentExtractor,
    pub links: LinkStatusStore,
    pub authenticity: AuthenticityFilter,
    pub classifier: ArticleLinkClassifier,
    pub max_articles: usize,
}

impl CrawlContext {
    pub fn new(config: &Config, client: Client, storage: SharedStorage) -> Self {
        let timeouts = FetchTimeouts::from_config(&config.http);
        let links = LinkStatusStore::new(storage);
        Self {
            extractor: ContentExtractor::new(client.clone(), timeouts, links.clone()),
            client,
            timeouts,
            links,
            authenticity: AuthenticityFilter::from_config(&config.trust),
            classifier: ArticleLinkClassifier::new(),
            max_articles: config.crawler.max_articles_per_source,
        }
    }

    /// Fetches an index page, feed or sitemap
    pub async fn fetch_index(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> crate::Result<String> {
        Ok(fetch_text(&self.client, url, self.timeouts.index, headers).await?)
    }

    /// The link classifier with the source's extra allowed domains applied
    pub fn classifier_for(&self, source: &SourceRecord) -> ArticleLinkClassifier {
        let mut classifier = self.classifier.clone();
        if !source.config.allowed_domains.is_empty() {
            classifier = classifier.with_allowed_domains(source.config.allowed_domains.clone());
        }
        classifier
    }

    /// Fetches an article page through the link cache and extracts its text
    pub async fn extract_page(&self, url: &str, source: &SourceRecord) -> Option<String> {
        self.extractor
            .extract(
                url,
                &source.name,
                source.config.content_selector.as_deref(),
                &source.config.headers,
            )
            .await
    }
}

/// One way of crawling a source
#[async_trait]
pub trait CrawlStrategy: Send + Sync {
    /// Stable identifier used in logs and override bindings
    fn name(&self) -> &'static str;

    /// Finds candidate article links, best first
    async fn discover(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
    ) -> crate::Result<Vec<Candidate>>;

    /// Produces the article text for one candidate
    async fn extract(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
        candidate: &Candidate,
    ) -> Option<String> {
        ctx.extract_page(&candidate.url, source).await
    }

    /// Articles with less text than this are dropped before the authenticity check
    fn min_content_chars(&self) -> usize {
        MIN_CONTENT_CHARS
    }
}

/// Runs a strategy against a source and returns the accepted articles
///
/// Discovery errors propagate; per-link problems only skip that link.
pub async fn harvest(
    strategy: &dyn CrawlStrategy,
    ctx: &CrawlContext,
    source: &SourceRecord,
) -> crate::Result<Vec<HarvestedArticle>> {
    let candidates = strategy.discover(ctx, source).await?;
    tracing::debug!(
        "{}: {} candidates via {}",
        source.name,
        candidates.len(),
        strategy.name()
    );

    let mut seen = HashSet::new();
    let shortlist: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.url.clone()))
        .filter(|candidate| match ctx.links.is_active(&candidate.url) {
            Ok(active) => {
                if !active {
                    tracing::debug!("{}: skipping inactive link {}", source.name, candidate.url);
                }
                active
            }
            Err(e) => {
                tracing::warn!("Link status lookup failed for {}: {}", candidate.url, e);
                true
            }
        })
        .take(ctx.max_articles)
        .collect();

    let mut articles = Vec::new();
    for candidate in shortlist {
        let Some(content) = strategy.extract(ctx, source, &candidate).await else {
            continue;
        };

        if content.chars().count() < strategy.min_content_chars() {
            tracing::debug!(
                "{}: insufficient content for '{}'",
                source.name,
                preview(&candidate.title)
            );
            continue;
        }

        if !ctx
            .authenticity
            .is_authentic(&candidate.title, &candidate.url, &content)
        {
            tracing::debug!(
                "{}: skipping non-authentic article '{}'",
                source.name,
                preview(&candidate.title)
            );
            continue;
        }

        articles.push(HarvestedArticle {
            url: candidate.url,
            title: candidate.title.trim().to_string(),
            source: source.name.clone(),
            content,
        });
    }

    tracing::info!(
        "{}: extracted {} articles via {}",
        source.name,
        articles.len(),
        strategy.name()
    );
    Ok(articles)
}

fn preview(title: &str) -> String {
    title.chars().take(50).collect()
}

/// Headers for a source's requests: its configured headers plus fixed extras
fn merged_headers(
    source: &SourceRecord,
    extra: &[(&str, &str)],
) -> BTreeMap<String, String> {
    let mut headers = source.config.headers.clone();
    for (name, value) in extra {
        headers
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    headers
}
