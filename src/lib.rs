//! News-Harvester: an autonomous regional news crawler
//!
//! This crate discovers articles on configured news sources (via RSS, sitemap or
//! HTML heuristics), extracts their main text, tracks source and link health, and
//! runs crawl cycles on an interval schedule.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod orchestrator;
pub mod output;
pub mod robots;
pub mod sources;
pub mod state;
pub mod storage;
pub mod strategy;
pub mod tracker;
pub mod url;

use thiserror::Error;

/// Main error type for News-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("RSS feed not found for {base_url}; provide an rss_url explicitly")]
    RssNotFound { base_url: String },

    #[error("Feed parse error: {0}")]
    Feed(String),

    #[error("Scheduler error: {0}")]
    Orchestrator(#[from] orchestrator::OrchestratorError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for News-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use orchestrator::CrawlOrchestrator;
pub use state::{CrawlType, LinkState, SourceHealth};
pub use url::{extract_domain, resolve_link};
