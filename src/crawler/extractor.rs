//! Main-text extraction from article pages
//!
//! Tries a list of well-known content containers first, then falls back to a
//! text-density scan over block elements.

use crate::crawler::fetcher::{fetch_text, FetchTimeouts};
use crate::crawler::html::{descendant_tag_count, element_text, raw_text_len, remove_selected};
use crate::tracker::LinkStatusStore;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Extracted text must be longer than this to be accepted
pub const MIN_CONTENT_CHARS: usize = 200;

/// Extracted text is truncated to this many characters
pub const MAX_CONTENT_CHARS: usize = 5000;

const STRIP_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "footer",
    "header",
    ".sidebar",
    ".ads",
    ".advertisement",
];

/// Content containers tried in order; the first whose text is long enough wins
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".content-body",
    ".isi-artikel",
    ".story-body",
    ".article__body",
    ".news-content",
    ".detail__body-text",
    ".read__content",
    "#article-content",
    ".content-article",
    ".post-body",
    "div[class*=\"content\"]",
    "div[class*=\"artikel\"]",
    "div[class*=\"article\"]",
    "div[class*=\"post\"]",
];

const DENSITY_CANDIDATES: &str = "div, section, article, main";

/// Extracts the main text from an HTML document
///
/// When `content_selector` is given and matches an element with enough text,
/// that element wins over the built-in container list.
pub fn extract_main_content(html: &str, content_selector: Option<&str>) -> Option<String> {
    let mut document = Html::parse_document(html);
    remove_selected(&mut document, STRIP_SELECTORS);

    let configured = content_selector.into_iter();
    for css in configured.chain(CONTENT_SELECTORS.iter().copied()) {
        let Ok(selector) = Selector::parse(css) else {
            tracing::warn!("Ignoring invalid content selector '{}'", css);
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if text.chars().count() > MIN_CONTENT_CHARS {
                return Some(truncate_chars(&text, MAX_CONTENT_CHARS));
            }
        }
    }

    densest_block(&document).map(|text| truncate_chars(&text, MAX_CONTENT_CHARS))
}

/// Picks the block element with the highest text-per-tag ratio
fn densest_block(document: &Html) -> Option<String> {
    let selector = Selector::parse(DENSITY_CANDIDATES).ok()?;

    let mut best: Option<(f64, String)> = None;
    for element in document.select(&selector) {
        let tags = descendant_tag_count(element);
        if tags == 0 {
            continue;
        }

        let text = element_text(element);
        if text.chars().count() <= MIN_CONTENT_CHARS {
            continue;
        }

        let density = raw_text_len(element) as f64 / (tags + 1) as f64;
        if best.as_ref().map(|(d, _)| density > *d).unwrap_or(true) {
            best = Some((density, text));
        }
    }

    best.map(|(_, text)| text)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Fetches article pages and extracts their text, recording link health
#[derive(Clone)]
pub struct ContentExtractor {
    client: Client,
    timeouts: FetchTimeouts,
    links: LinkStatusStore,
}

impl ContentExtractor {
    pub fn new(client: Client, timeouts: FetchTimeouts, links: LinkStatusStore) -> Self {
        Self {
            client,
            timeouts,
            links,
        }
    }

    /// Fetches `url` and returns its main text
    ///
    /// Returns `None` when the link is already known to be dead, when the fetch
    /// fails (the failure is recorded against the link), or when no content
    /// block is long enough.
    pub async fn extract(
        &self,
        url: &str,
        source_name: &str,
        content_selector: Option<&str>,
        headers: &BTreeMap<String, String>,
    ) -> Option<String> {
        match self.links.is_active(url) {
            Ok(false) => {
                tracing::debug!("Skipping inactive link {}", url);
                return None;
            }
            Ok(true) => {}
            Err(e) => tracing::warn!("Link status lookup failed for {}: {}", url, e),
        }

        let html = match fetch_text(&self.client, url, self.timeouts.content, headers).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("{}: failed to fetch {}: {}", source_name, url, e.reason());
                if let Err(store_err) = self.links.mark_failed(url, &e, Some(source_name)) {
                    tracing::warn!("Could not record link failure for {}: {}", url, store_err);
                }
                return None;
            }
        };

        if let Err(e) = self.links.mark_active(url) {
            tracing::warn!("Could not record link success for {}: {}", url, e);
        }

        let content = extract_main_content(&html, content_selector);
        if content.is_none() {
            tracing::debug!("{}: no content block found at {}", source_name, url);
        }
        content
    }
}
