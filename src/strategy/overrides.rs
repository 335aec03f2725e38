//! Dedicated strategies for well-known sources
//!
//! These sit on top of the generic engine for sites whose markup the generic
//! heuristics handle poorly. They are bound to sources by name, or explicitly
//! through the `strategy` key of a source's config.

use super::{CrawlContext, CrawlStrategy, Candidate, RssStrategy};
use crate::crawler::{element_text, is_valid_article_url};
use crate::storage::SourceRecord;
use crate::url::{canonical_url, resolve_link, slug_title};
use crate::HarvestError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Titles shorter than this are replaced or rejected
const MIN_LISTING_TITLE: usize = 5;

/// A listing-page strategy described entirely by data
#[derive(Debug, Clone)]
pub struct ListingOverride {
    id: &'static str,
    index_url: String,
    /// Section pages linked from the index, crawled instead of the index itself
    section_marker: Option<&'static str>,
    max_sections: usize,
    /// Elements holding one article each; the first link inside is used
    container: Option<&'static str>,
    /// Tried inside the container before the link text
    title_selectors: &'static [&'static str],
    href_contains: Option<&'static str>,
    href_excludes: Option<&'static str>,
    allowed_domain: Option<&'static str>,
    require_https: bool,
    slug_titles: bool,
    min_content: usize,
}

impl ListingOverride {
    fn base(id: &'static str, index_url: &str) -> Self {
        Self {
            id,
            index_url: index_url.to_string(),
            section_marker: None,
            max_sections: 0,
            container: None,
            title_selectors: &[],
            href_contains: None,
            href_excludes: None,
            allowed_domain: None,
            require_https: false,
            slug_titles: true,
            min_content: 150,
        }
    }

    /// Detik Sumbagsel: one `<article>` element per story
    pub fn detik() -> Self {
        Self {
            container: Some("article"),
            title_selectors: &["h2", "h3", "strong", "a.title"],
            allowed_domain: Some("detik.com"),
            require_https: true,
            ..Self::base("detik", "https://www.detik.com/sumbagsel")
        }
    }

    /// Suara Lampung: stories live under `lampung.suara.com/read/`
    pub fn suara() -> Self {
        Self {
            href_contains: Some("lampung.suara.com/read/"),
            min_content: 250,
            ..Self::base("suara", "https://www.suara.com/lampung")
        }
    }

    /// Lampung Pro: stories are listed on `/kategori/news/` section pages
    pub fn lampung_pro() -> Self {
        Self {
            section_marker: Some("/kategori/news/"),
            max_sections: 5,
            href_contains: Some("/news/"),
            href_excludes: Some("/kategori/news/"),
            allowed_domain: Some("lampungpro.co"),
            slug_titles: false,
            ..Self::base("lampung-pro", "https://lampungpro.co")
        }
    }

    /// Points the strategy at another index page
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    /// Restricts links to another domain
    pub fn with_allowed_domain(mut self, domain: &'static str) -> Self {
        self.allowed_domain = Some(domain);
        self
    }

    /// Section page URLs linked from the index, in page order
    fn section_urls(&self, html: &str, page_url: &Url) -> Vec<Url> {
        let Some(marker) = self.section_marker else {
            return Vec::new();
        };
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        document
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(marker))
            .filter_map(|href| resolve_link(href, page_url))
            .filter(|url| seen.insert(url.to_string()))
            .take(self.max_sections)
            .collect()
    }

    /// Article candidates on one listing page
    pub fn listing_candidates(&self, html: &str, page_url: &Url) -> crate::Result<Vec<Candidate>> {
        let anchor = Selector::parse("a[href]")
            .map_err(|e| HarvestError::Validation(format!("anchor selector: {}", e)))?;
        let document = Html::parse_document(html);

        let links: Vec<(ElementRef<'_>, Option<ElementRef<'_>>)> = match self.container {
            Some(css) => {
                let container = Selector::parse(css)
                    .map_err(|e| HarvestError::Validation(format!("container selector '{}': {}", css, e)))?;
                document
                    .select(&container)
                    .filter_map(|c| c.select(&anchor).next().map(|a| (a, Some(c))))
                    .collect()
            }
            None => document.select(&anchor).map(|a| (a, None)).collect(),
        };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (link, container) in links {
            let Some(href) = link.value().attr("href").map(str::trim) else {
                continue;
            };
            if self.require_https && !href.starts_with("https") {
                continue;
            }
            let Some(resolved) = resolve_link(href, page_url) else {
                continue;
            };

            let lower = resolved.as_str().to_lowercase();
            if self.href_contains.is_some_and(|needle| !lower.contains(needle)) {
                continue;
            }
            if self.href_excludes.is_some_and(|needle| lower.contains(needle)) {
                continue;
            }
            if let Some(domain) = self.allowed_domain {
                if !is_valid_article_url(&resolved, domain) {
                    continue;
                }
            }

            let url = canonical_url(&resolved);
            if !seen.insert(url.to_string()) {
                continue;
            }

            let Some(title) = self.title_for(link, container, &url) else {
                tracing::debug!("{}: no usable title for {}", self.id, url);
                continue;
            };
            candidates.push(Candidate::new(url.to_string(), title));
        }

        Ok(candidates)
    }

    fn title_for(&self, link: ElementRef<'_>, container: Option<ElementRef<'_>>, url: &Url) -> Option<String> {
        let long_enough = |t: &String| t.chars().count() >= MIN_LISTING_TITLE;

        let from_container = container.and_then(|c| {
            self.title_selectors.iter().find_map(|css| {
                let selector = Selector::parse(css).ok()?;
                c.select(&selector)
                    .next()
                    .map(element_text)
                    .filter(|t| t.chars().count() > MIN_LISTING_TITLE)
            })
        });

        from_container
            .or_else(|| Some(element_text(link)).filter(long_enough))
            .or_else(|| {
                self.slug_titles
                    .then(|| slug_title(url))
                    .filter(long_enough)
            })
    }
}

#[async_trait]
impl CrawlStrategy for ListingOverride {
    fn name(&self) -> &'static str {
        self.id
    }

    async fn discover(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
    ) -> crate::Result<Vec<Candidate>> {
        let index = Url::parse(&self.index_url)?;
        let headers = &source.config.headers;
        let html = ctx.fetch_index(index.as_str(), headers).await?;

        if self.section_marker.is_none() {
            return self.listing_candidates(&html, &index);
        }

        let sections = self.section_urls(&html, &index);
        tracing::debug!("{}: found {} section pages", self.id, sections.len());

        let mut candidates = Vec::new();
        for section in sections {
            let page = match ctx.fetch_index(section.as_str(), headers).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!("{}: failed to fetch section {}: {}", self.id, section, e);
                    continue;
                }
            };
            candidates.extend(self.listing_candidates(&page, &section)?);
        }
        Ok(candidates)
    }

    fn min_content_chars(&self) -> usize {
        self.min_content
    }
}

/// Maps source names and explicit strategy ids to dedicated strategies
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn CrawlStrategy>>,
    bindings: HashMap<String, &'static str>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dedicated strategies for the regional sources this crawler started with
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ListingOverride::detik()));
        registry.register(Arc::new(ListingOverride::suara()));
        registry.register(Arc::new(ListingOverride::lampung_pro()));
        registry.register(Arc::new(
            RssStrategy::page_first("tribun-lampung", "https://lampung.tribunnews.com/rss")
                .with_header("Accept-Language", "id-ID,id;q=0.9,en-US;q=0.8"),
        ));

        registry.bind("Detik", "detik");
        registry.bind("Suara", "suara");
        registry.bind("Lampung Pro", "lampung-pro");
        registry.bind("Tribun Lampung", "tribun-lampung");
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn CrawlStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    /// Routes sources named `source_name` to the strategy `id`
    pub fn bind(&mut self, source_name: impl Into<String>, id: &'static str) {
        self.bindings.insert(source_name.into(), id);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn CrawlStrategy>> {
        self.strategies.get(id).cloned()
    }

    /// Dedicated strategy for a source: an explicit `strategy` config key wins
    /// over a name binding
    pub fn resolve(&self, source: &SourceRecord) -> Option<Arc<dyn CrawlStrategy>> {
        if let Some(id) = source.config.strategy.as_deref() {
            match self.get(id) {
                Some(strategy) => return Some(strategy),
                None => tracing::warn!("{}: unknown strategy '{}'", source.name, id),
            }
        }
        self.bindings.get(&source.name).and_then(|id| self.get(id))
    }
}
