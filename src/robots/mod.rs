//! Robots.txt handling module
//!
//! Only the `Sitemap:` directives are used: they are the second place the crawl
//! type detector looks for a sitemap after `/sitemap.xml`.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::{fetch_text, FetchError};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Fetches `/robots.txt` for the site `base` belongs to
pub async fn fetch_robots(
    client: &Client,
    base: &Url,
    timeout: Duration,
) -> Result<ParsedRobots, FetchError> {
    let robots_url = base
        .join("/robots.txt")
        .map_err(|e| FetchError::Request(e.to_string()))?;
    let content = fetch_text(client, robots_url.as_str(), timeout, &BTreeMap::new()).await?;
    Ok(ParsedRobots::from_content(&content))
}
