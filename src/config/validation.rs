use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, SeedSource, TrustConfig};
use crate::orchestrator::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_trust_config(&config.trust)?;
    validate_seed_sources(&config.source)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.interval_seconds < MIN_INTERVAL_SECS || config.interval_seconds > MAX_INTERVAL_SECS {
        return Err(ConfigError::Validation(format!(
            "interval_seconds must be between {} and {}, got {}",
            MIN_INTERVAL_SECS, MAX_INTERVAL_SECS, config.interval_seconds
        )));
    }

    if config.max_articles_per_source < 1 {
        return Err(ConfigError::Validation(format!(
            "max_articles_per_source must be >= 1, got {}",
            config.max_articles_per_source
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("probe_timeout_secs", config.probe_timeout_secs),
        ("index_timeout_secs", config.index_timeout_secs),
        ("content_timeout_secs", config.content_timeout_secs),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates authenticity trust tiers
fn validate_trust_config(config: &TrustConfig) -> Result<(), ConfigError> {
    for pattern in &config.relaxed_domains {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

/// Validates seed source entries
fn validate_seed_sources(sources: &[SeedSource]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Seed source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate seed source name '{}'",
                source.name
            )));
        }

        let url = Url::parse(&source.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", source.base_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Base URL '{}' must use http or https",
                source.base_url
            )));
        }

        for pattern in &source.config.allowed_domains {
            validate_domain_pattern(pattern)?;
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty()
        || !domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            pattern
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            pattern
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'detik.com')",
            pattern
        )));
    }

    Ok(())
}
