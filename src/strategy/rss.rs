//! Feed-driven crawling

use super::{merged_headers, CrawlContext, CrawlStrategy, Candidate};
use crate::crawler::{html_to_text, parse_feed, MIN_CONTENT_CHARS};
use crate::storage::SourceRecord;
use crate::url::resolve_link;
use crate::HarvestError;
use async_trait::async_trait;
use url::Url;

/// Feed content at least this long is used without fetching the page
const FEED_CONTENT_SUFFICIENT: usize = MIN_CONTENT_CHARS;

/// Crawls a source through its RSS or Atom feed
#[derive(Debug, Clone)]
pub struct RssStrategy {
    name: &'static str,
    /// Fixed feed URL; `None` reads `rss_url` from the source config
    feed_url: Option<String>,
    /// Prefer the article page over feed content
    page_first: bool,
    min_content: usize,
    extra_headers: Vec<(&'static str, &'static str)>,
}

impl Default for RssStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RssStrategy {
    /// Generic strategy: feed content first, page fetch when the feed is thin
    pub fn new() -> Self {
        Self {
            name: "rss",
            feed_url: None,
            page_first: false,
            min_content: 150,
            extra_headers: Vec::new(),
        }
    }

    /// Strategy for feeds whose entries carry little text: the article page is
    /// fetched first and feed content is only a fallback
    pub fn page_first(name: &'static str, feed_url: impl Into<String>) -> Self {
        Self {
            name,
            feed_url: Some(feed_url.into()),
            page_first: true,
            ..Self::new()
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.extra_headers.push((name, value));
        self
    }

    fn feed_url(&self, source: &SourceRecord) -> crate::Result<String> {
        self.feed_url
            .clone()
            .or_else(|| source.config.rss_url.clone())
            .ok_or_else(|| HarvestError::Validation(format!("{}: no rss_url configured", source.name)))
    }
}

#[async_trait]
impl CrawlStrategy for RssStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn discover(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
    ) -> crate::Result<Vec<Candidate>> {
        let feed_url = self.feed_url(source)?;
        let headers = merged_headers(source, &self.extra_headers);
        let xml = ctx.fetch_index(&feed_url, &headers).await?;

        let entries = parse_feed(&xml)?;
        if entries.is_empty() {
            tracing::warn!("{}: feed returned no entries from {}", source.name, feed_url);
        }

        let base = Url::parse(&feed_url)?;
        let candidates = entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry.title?.trim().to_string();
                let link = resolve_link(entry.link.as_deref()?, &base)?;
                if title.is_empty() {
                    return None;
                }
                let feed_content = entry
                    .content
                    .or(entry.summary)
                    .map(|html| html_to_text(&html))
                    .filter(|text| !text.is_empty());
                Some(Candidate {
                    url: link.to_string(),
                    title,
                    feed_content,
                })
            })
            .collect();

        Ok(candidates)
    }

    async fn extract(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
        candidate: &Candidate,
    ) -> Option<String> {
        let feed_text = candidate.feed_content.clone().unwrap_or_default();

        if self.page_first {
            return match ctx.extract_page(&candidate.url, source).await {
                Some(page) if page.chars().count() > self.min_content => Some(page),
                _ => Some(feed_text).filter(|t| !t.is_empty()),
            };
        }

        if feed_text.chars().count() >= FEED_CONTENT_SUFFICIENT {
            return Some(feed_text);
        }

        match ctx.extract_page(&candidate.url, source).await {
            Some(page) if page.chars().count() > feed_text.chars().count() => Some(page),
            _ => Some(feed_text).filter(|t| !t.is_empty()),
        }
    }

    fn min_content_chars(&self) -> usize {
        self.min_content
    }
}
