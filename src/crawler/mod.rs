//! Crawler building blocks
//!
//! This module contains the pieces every crawl strategy is assembled from:
//! - HTTP fetching with typed failures and existence probes
//! - Crawl type detection (feed, sitemap or HTML)
//! - Feed and sitemap parsing
//! - Article link classification and ranking on index pages
//! - Main-content extraction and the authenticity filter

mod authenticity;
mod classifier;
mod detector;
mod extractor;
mod feed;
mod fetcher;
mod html;
mod sitemap;

pub use authenticity::{AuthenticityFilter, MIN_ARTICLE_CHARS};
pub use classifier::{
    is_navigation_text, is_social_url, is_valid_article_url, strip_page_chrome,
    ArticleLinkClassifier, LinkCandidate,
};
pub use detector::{CrawlTypeDetector, Detection};
pub use extractor::{extract_main_content, ContentExtractor, MAX_CONTENT_CHARS, MIN_CONTENT_CHARS};
pub use feed::{parse_feed, FeedEntry};
pub use fetcher::{build_http_client, fetch_text, url_exists, FetchError, FetchTimeouts};
pub use html::{element_text, html_to_text};
pub use sitemap::{parse_sitemap, SitemapDocument};
