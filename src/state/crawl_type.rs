//! Crawl type and per-source strategy configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a source is crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlType {
    Rss,
    Html,
    Sitemap,
    /// Resolved to one of the concrete types by detection before crawling
    Auto,
}

impl CrawlType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Html => "html",
            Self::Sitemap => "sitemap",
            Self::Auto => "auto",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rss" => Some(Self::Rss),
            "html" => Some(Self::Html),
            "sitemap" => Some(Self::Sitemap),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Allow/deny filters applied to candidate links of generic HTML crawls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_not_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_contains: Option<String>,
}

impl LinkFilters {
    pub fn is_empty(&self) -> bool {
        self.href_contains.is_none() && self.href_not_contains.is_none() && self.text_contains.is_none()
    }

    /// Applies the filters to a resolved link and its anchor text
    pub fn accepts(&self, href: &str, text: &str) -> bool {
        if let Some(needle) = &self.href_contains {
            if !href.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.href_not_contains {
            if href.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.text_contains {
            if !text.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Strategy configuration stored with each source
///
/// Keys are snake_case to match the JSON persisted in the `sources.config` column.
/// Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_selector: Option<String>,
    /// Explicit binding to a domain override strategy (e.g. "detik")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "LinkFilters::is_empty")]
    pub filters: LinkFilters,
    /// Domain patterns (`*.` wildcards allowed) that discovered links may point
    /// at besides the source's own site
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SourceConfig {
    /// Overlays `other` on top of `self`; values present in `other` win
    pub fn merge(&mut self, other: SourceConfig) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.rss_url, other.rss_url);
        take(&mut self.sitemap_url, other.sitemap_url);
        take(&mut self.index_url, other.index_url);
        take(&mut self.base_url, other.base_url);
        take(&mut self.link_selector, other.link_selector);
        take(&mut self.title_selector, other.title_selector);
        take(&mut self.content_selector, other.content_selector);
        take(&mut self.strategy, other.strategy);
        take(&mut self.filters.href_contains, other.filters.href_contains);
        take(&mut self.filters.href_not_contains, other.filters.href_not_contains);
        take(&mut self.filters.text_contains, other.filters.text_contains);
        if !other.allowed_domains.is_empty() {
            self.allowed_domains = other.allowed_domains;
        }
        self.headers.extend(other.headers);
        self.extra.extend(other.extra);
    }
}
