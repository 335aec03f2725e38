//! Crawl type detection
//!
//! Decides how a site should be crawled, in order of preference: an RSS/Atom
//! feed, a sitemap, and finally heuristic HTML discovery. Detection never fails;
//! every error degrades to the HTML fallback.

use crate::crawler::fetcher::{fetch_text, url_exists, FetchTimeouts};
use crate::robots::fetch_robots;
use crate::state::{CrawlType, SourceConfig};
use crate::url::{base_origin, resolve_link};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Conventional feed locations, probed in order
const FEED_PATHS: &[&str] = &[
    "/rss",
    "/rss.xml",
    "/feed",
    "/feed.xml",
    "/feeds",
    "/feeds/rss",
    "/index.php/rss",
];

/// At most this many feed candidates are returned
const MAX_FEEDS: usize = 3;

/// Outcome of a detection run
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub crawl_type: CrawlType,
    pub config: SourceConfig,
    /// False when nothing was found and the HTML fallback was chosen
    pub detected: bool,
}

impl Detection {
    fn html_fallback(base_url: &str) -> Self {
        Self {
            crawl_type: CrawlType::Html,
            config: SourceConfig {
                base_url: Some(base_url.to_string()),
                index_url: Some(base_url.to_string()),
                ..SourceConfig::default()
            },
            detected: false,
        }
    }
}

#[derive(Clone)]
pub struct CrawlTypeDetector {
    client: Client,
    timeouts: FetchTimeouts,
}

impl CrawlTypeDetector {
    pub fn new(client: Client, timeouts: FetchTimeouts) -> Self {
        Self { client, timeouts }
    }

    /// Detects the crawl type for a site
    pub async fn detect(&self, base_url: &str) -> Detection {
        let Ok(url) = Url::parse(base_url) else {
            tracing::warn!("Cannot detect crawl type for invalid URL '{}'", base_url);
            return Detection::html_fallback(base_url);
        };

        let feeds = self.detect_feeds(&url).await;
        if let Some(feed) = feeds.into_iter().next() {
            tracing::info!("Detected RSS feed at {}: {}", base_url, feed);
            return Detection {
                crawl_type: CrawlType::Rss,
                config: SourceConfig {
                    rss_url: Some(feed),
                    ..SourceConfig::default()
                },
                detected: true,
            };
        }

        if let Some(sitemap) = self.detect_sitemap(&url).await {
            tracing::info!("Detected sitemap at {}: {}", base_url, sitemap);
            return Detection {
                crawl_type: CrawlType::Sitemap,
                config: SourceConfig {
                    sitemap_url: Some(sitemap),
                    ..SourceConfig::default()
                },
                detected: true,
            };
        }

        tracing::info!("Using heuristic HTML crawling for {}", base_url);
        Detection::html_fallback(base_url)
    }

    /// Feed URLs found at conventional paths or advertised by the homepage
    pub async fn detect_feeds(&self, url: &Url) -> Vec<String> {
        let origin = base_origin(url);
        let mut feeds = Vec::new();

        for path in FEED_PATHS {
            let candidate = format!("{}{}", origin, path);
            if url_exists(&self.client, &candidate, self.timeouts.probe).await {
                feeds.push(candidate);
            }
        }

        match fetch_text(&self.client, url.as_str(), self.timeouts.index, &BTreeMap::new()).await {
            Ok(html) => {
                for feed in advertised_feeds(&html, url) {
                    if !feeds.contains(&feed) {
                        feeds.push(feed);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Could not read homepage for feed detection at {}: {}", url, e);
            }
        }

        feeds.truncate(MAX_FEEDS);
        feeds
    }

    /// `/sitemap.xml`, or the first reachable `Sitemap:` entry of robots.txt
    pub async fn detect_sitemap(&self, url: &Url) -> Option<String> {
        let candidate = format!("{}/sitemap.xml", base_origin(url));
        if url_exists(&self.client, &candidate, self.timeouts.probe).await {
            return Some(candidate);
        }

        let robots = match fetch_robots(&self.client, url, self.timeouts.index).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::debug!("Could not check robots.txt for {}: {}", url, e);
                return None;
            }
        };

        for sitemap in robots.sitemaps(url) {
            if url_exists(&self.client, &sitemap, self.timeouts.probe).await {
                return Some(sitemap);
            }
        }
        None
    }
}

/// Feed links declared with `<link rel="alternate">` or `<link rel="feed">`
fn advertised_feeds(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("link[rel][href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|link| {
            link.value()
                .attr("rel")
                .map(|rel| {
                    rel.split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("alternate") || r.eq_ignore_ascii_case("feed"))
                })
                .unwrap_or(false)
        })
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| {
            let lower = href.to_lowercase();
            lower.contains("rss") || lower.contains("feed") || lower.contains("atom")
        })
        .filter_map(|href| resolve_link(href, page_url))
        .map(|u| u.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertised_feeds() {
        let html = r#"<html><head>
            <link rel="alternate" type="application/rss+xml" href="/rss/berita.xml">
            <link rel="alternate" hreflang="en" href="/en/">
            <link rel="stylesheet" href="/feed.css">
            <link rel="feed" href="https://cdn.example.id/atom">
        </head></html>"#;
        let page = Url::parse("https://lampung.example.id/").unwrap();

        assert_eq!(
            advertised_feeds(html, &page),
            vec![
                "https://lampung.example.id/rss/berita.xml".to_string(),
                "https://cdn.example.id/atom".to_string()
            ]
        );
    }

    #[test]
    fn test_html_fallback_config() {
        let detection = Detection::html_fallback("https://lampungpro.co");
        assert_eq!(detection.crawl_type, CrawlType::Html);
        assert!(!detection.detected);
        assert_eq!(detection.config.index_url.as_deref(), Some("https://lampungpro.co"));
    }

    #[tokio::test]
    async fn test_invalid_url_falls_back_to_html() {
        let detector = CrawlTypeDetector::new(Client::new(), FetchTimeouts::default());
        let detection = detector.detect("not a url").await;
        assert_eq!(detection.crawl_type, CrawlType::Html);
    }
}
