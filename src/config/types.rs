use crate::state::{CrawlType, SourceConfig};
use serde::Deserialize;

/// Main configuration structure for News-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub trust: TrustConfig,
    #[serde(default)]
    pub source: Vec<SeedSource>,
}

/// Crawl cycle behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seconds between scheduled crawl cycles
    #[serde(rename = "interval-seconds", default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Maximum number of accepted articles per source per cycle
    #[serde(rename = "max-articles-per-source", default = "default_max_articles")]
    pub max_articles_per_source: usize,

    /// Run one cycle as soon as the daemon boots instead of waiting a full interval
    #[serde(rename = "auto-start", default)]
    pub auto_start: bool,

    /// Articles older than this many days are purged after each cycle (0 disables)
    #[serde(rename = "retention-days", default = "default_retention_days")]
    pub retention_days: u32,

    /// Route well-known sources to their dedicated crawl strategies
    #[serde(rename = "domain-overrides", default = "default_true")]
    pub domain_overrides: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            max_articles_per_source: default_max_articles(),
            auto_start: false,
            retention_days: default_retention_days(),
            domain_overrides: true,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for feed/sitemap existence probes
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for index pages and feeds
    #[serde(rename = "index-timeout-secs", default = "default_index_timeout")]
    pub index_timeout_secs: u64,

    /// Timeout for article page fetches
    #[serde(rename = "content-timeout-secs", default = "default_content_timeout")]
    pub content_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            probe_timeout_secs: default_probe_timeout(),
            index_timeout_secs: default_index_timeout(),
            content_timeout_secs: default_content_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Authenticity trust tiers
#[derive(Debug, Clone, Deserialize)]
pub struct TrustConfig {
    /// Domain patterns (e.g. "detik.com" or "*.detik.com") that get the relaxed rule
    #[serde(rename = "relaxed-domains", default = "default_relaxed_domains")]
    pub relaxed_domains: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            relaxed_domains: default_relaxed_domains(),
        }
    }
}

/// A source inserted at startup when no source with the same name exists
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSource {
    pub name: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "crawl-type", default = "default_crawl_type")]
    pub crawl_type: CrawlType,

    /// Strategy configuration, stored as-is in the source record
    #[serde(default)]
    pub config: SourceConfig,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(rename = "auto-detect", default = "default_true")]
    pub auto_detect: bool,
}

fn default_interval_seconds() -> u64 {
    86_400
}

fn default_max_articles() -> usize {
    10
}

fn default_retention_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string()
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_index_timeout() -> u64 {
    15
}

fn default_content_timeout() -> u64 {
    20
}

fn default_relaxed_domains() -> Vec<String> {
    vec!["lampungpro.co".to_string(), "detik.com".to_string()]
}

fn default_crawl_type() -> CrawlType {
    CrawlType::Auto
}
