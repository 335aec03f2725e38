//! Index-page crawling driven by the stored source configuration

use super::{CrawlContext, CrawlStrategy, Candidate};
use crate::crawler::{element_text, is_navigation_text, is_valid_article_url, ArticleLinkClassifier};
use crate::state::LinkFilters;
use crate::storage::SourceRecord;
use crate::url::{canonical_url, extract_domain, resolve_link, slug_title, strip_www};
use crate::HarvestError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Crawls a source's index page
///
/// With a `link_selector` the configured selectors drive discovery; without one
/// the article link classifier does.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlStrategy;

/// Index page and link base for a source
fn index_and_base(source: &SourceRecord) -> crate::Result<(Url, Url)> {
    let base = source
        .config
        .base_url
        .as_deref()
        .unwrap_or(&source.base_url);
    let base = Url::parse(base)?;
    let index = match source.config.index_url.as_deref() {
        Some(index) => Url::parse(index)?,
        None => base.clone(),
    };
    Ok((index, base))
}

#[async_trait]
impl CrawlStrategy for HtmlStrategy {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn discover(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
    ) -> crate::Result<Vec<Candidate>> {
        let (index, base) = index_and_base(source)?;
        let html = ctx.fetch_index(index.as_str(), &source.config.headers).await?;

        match source.config.link_selector.as_deref() {
            Some(link_selector) => selector_candidates(
                &html,
                link_selector,
                source.config.title_selector.as_deref(),
                &base,
                &source.config.filters,
            ),
            None => Ok(classified_candidates(
                &ctx.classifier_for(source),
                &html,
                &index,
                &source.config.filters,
            )),
        }
    }
}

/// Candidates from the link classifier, narrowed by the source's filters
pub(super) fn classified_candidates(
    classifier: &ArticleLinkClassifier,
    html: &str,
    page_url: &Url,
    filters: &LinkFilters,
) -> Vec<Candidate> {
    classifier
        .discover(html, page_url)
        .into_iter()
        .filter(|link| filters.accepts(&link.url, &link.title))
        .map(|link| Candidate::new(link.url, link.title))
        .collect()
}

/// Candidates from a configured link selector
///
/// Each match must carry (or contain) an `href` that resolves under the base
/// domain. The title comes from the anchor text, then `title_selector` inside
/// the match, then the URL slug.
pub fn selector_candidates(
    html: &str,
    link_selector: &str,
    title_selector: Option<&str>,
    base: &Url,
    filters: &LinkFilters,
) -> crate::Result<Vec<Candidate>> {
    let links = Selector::parse(link_selector)
        .map_err(|e| HarvestError::Validation(format!("invalid link_selector '{}': {}", link_selector, e)))?;
    let titles = match title_selector {
        Some(css) => Some(
            Selector::parse(css)
                .map_err(|e| HarvestError::Validation(format!("invalid title_selector '{}': {}", css, e)))?,
        ),
        None => None,
    };
    let anchor = Selector::parse("a[href]")
        .map_err(|e| HarvestError::Validation(format!("anchor selector: {}", e)))?;

    let domain = extract_domain(base)
        .map(|host| strip_www(&host).to_string())
        .unwrap_or_default();

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for element in document.select(&links) {
        let Some(link) = link_element(element, &anchor) else {
            continue;
        };
        let Some(resolved) = link.value().attr("href").and_then(|href| resolve_link(href, base))
        else {
            continue;
        };
        if !is_valid_article_url(&resolved, &domain) {
            continue;
        }

        let text = element_text(link);
        if !text.is_empty() && is_navigation_text(&text) {
            tracing::debug!("Skipping navigation link '{}'", text);
            continue;
        }

        let url = canonical_url(&resolved);
        if !filters.accepts(url.as_str(), &text) {
            continue;
        }
        if !seen.insert(url.to_string()) {
            continue;
        }

        let title = Some(text)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                titles
                    .as_ref()
                    .and_then(|sel| element.select(sel).next())
                    .map(element_text)
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| slug_title(&url));
        if title.is_empty() {
            continue;
        }

        candidates.push(Candidate::new(url.to_string(), title));
    }

    Ok(candidates)
}

/// The matched element itself when it has an `href`, else its first link
fn link_element<'a>(element: ElementRef<'a>, anchor: &Selector) -> Option<ElementRef<'a>> {
    if element.value().attr("href").is_some() {
        return Some(element);
    }
    element.select(anchor).next()
}
