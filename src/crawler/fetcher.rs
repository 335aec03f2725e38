//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests with per-request timeouts and source-specific headers
//! - HEAD-then-GET existence probes used by crawl type detection
//! - Error classification into link status reasons

use crate::config::HttpConfig;
use crate::state::LinkState;
use reqwest::{Client, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Human-readable reason stored in link status records
    pub fn reason(&self) -> String {
        match self {
            Self::Timeout => "Connection timeout".to_string(),
            Self::Connection(_) => "Connection error".to_string(),
            Self::Http { status } => format!("HTTP {} Error", status),
            Self::Request(msg) => {
                let short: String = msg.chars().take(100).collect();
                format!("Request error: {}", short)
            }
        }
    }

    /// Link state a URL moves to after this failure
    pub fn link_state(&self) -> LinkState {
        match self {
            Self::Timeout => LinkState::Timeout,
            Self::Connection(_) | Self::Http { .. } => LinkState::Inactive,
            Self::Request(_) => LinkState::Error,
        }
    }

    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Per-purpose request timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    /// Feed and sitemap existence probes
    pub probe: Duration,
    /// Index pages, feeds and sitemaps
    pub index: Duration,
    /// Article pages
    pub content: Duration,
}

impl FetchTimeouts {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            probe: Duration::from_secs(config.probe_timeout_secs),
            index: Duration::from_secs(config.index_timeout_secs),
            content: Duration::from_secs(config.content_timeout_secs),
        }
    }
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

/// Builds the HTTP client shared by every component
///
/// Redirects are followed (reqwest's default limit of 10 hops). Timeouts are set
/// per request, so the client-wide value is only an upper bound.
///
/// ```no_run
/// use news_harvester::config::HttpConfig;
/// use news_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body as text
///
/// Any status of 400 or above is an error.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    timeout: Duration,
    headers: &BTreeMap<String, String>,
) -> Result<String, FetchError> {
    let mut request = client.get(url).timeout(timeout);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await.map_err(FetchError::classify)?;
    let response = check_status(response)?;
    response.text().await.map_err(FetchError::classify)
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(FetchError::Http {
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Checks whether a URL exists: status below 400 via HEAD, or via GET when HEAD fails
pub async fn url_exists(client: &Client, url: &str, timeout: Duration) -> bool {
    match client.head(url).timeout(timeout).send().await {
        Ok(response) if response.status().as_u16() < 400 => return true,
        Ok(response) => {
            tracing::debug!("HEAD {} returned {}, retrying with GET", url, response.status());
        }
        Err(e) => {
            tracing::debug!("HEAD {} failed ({}), retrying with GET", url, e);
        }
    }

    match client.get(url).timeout(timeout).send().await {
        Ok(response) => response.status().as_u16() < 400,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_reasons() {
        assert_eq!(FetchError::Timeout.reason(), "Connection timeout");
        assert_eq!(
            FetchError::Connection("refused".to_string()).reason(),
            "Connection error"
        );
        assert_eq!(FetchError::Http { status: 404 }.reason(), "HTTP 404 Error");
        assert_eq!(
            FetchError::Request("bad header".to_string()).reason(),
            "Request error: bad header"
        );
    }

    #[test]
    fn test_request_reason_truncated() {
        let reason = FetchError::Request("x".repeat(500)).reason();
        assert_eq!(reason.len(), "Request error: ".len() + 100);
    }

    #[test]
    fn test_link_states() {
        assert_eq!(FetchError::Timeout.link_state(), LinkState::Timeout);
        assert_eq!(FetchError::Http { status: 500 }.link_state(), LinkState::Inactive);
        assert_eq!(
            FetchError::Request(String::new()).link_state(),
            LinkState::Error
        );
    }

    #[test]
    fn test_timeouts_from_config() {
        let timeouts = FetchTimeouts::default();
        assert_eq!(timeouts.probe, Duration::from_secs(5));
        assert_eq!(timeouts.index, Duration::from_secs(15));
        assert_eq!(timeouts.content, Duration::from_secs(20));
    }
}
