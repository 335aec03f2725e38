use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use news_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Sources: {}", config.source.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 digest of raw configuration text
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration together with the digest of the file it came from
///
/// The file is read once, so the digest always matches the parsed config.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_hash(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CrawlType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
interval-seconds = 3600
max-articles-per-source = 5
auto-start = true

[http]
content-timeout-secs = 25

[output]
database-path = "./news.db"

[trust]
relaxed-domains = ["detik.com", "*.lampungpro.co"]

[[source]]
name = "Kompas"
base-url = "https://www.kompas.com"
crawl-type = "rss"
config = { rss_url = "https://indeks.kompas.com/rss" }

[[source]]
name = "Radar Lampung"
base-url = "https://radarlampung.disway.id"
crawl-type = "html"
config = { index_url = "https://radarlampung.disway.id/", filters = { href_contains = "/read/" } }
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.interval_seconds, 3600);
        assert_eq!(config.crawler.max_articles_per_source, 5);
        assert!(config.crawler.auto_start);
        assert_eq!(config.crawler.retention_days, 30);
        assert_eq!(config.http.content_timeout_secs, 25);
        assert_eq!(config.http.probe_timeout_secs, 5);
        assert_eq!(config.trust.relaxed_domains.len(), 2);
        assert_eq!(config.source.len(), 2);
        assert_eq!(config.source[0].crawl_type, CrawlType::Rss);
        assert_eq!(
            config.source[0].config.rss_url.as_deref(),
            Some("https://indeks.kompas.com/rss")
        );
        assert_eq!(
            config.source[1].config.filters.href_contains.as_deref(),
            Some("/read/")
        );
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[output]
database-path = "./news.db"
"#,
        )
        .unwrap();

        assert_eq!(config.crawler.interval_seconds, 86_400);
        assert_eq!(config.crawler.max_articles_per_source, 10);
        assert!(!config.crawler.auto_start);
        assert_eq!(
            config.trust.relaxed_domains,
            vec!["lampungpro.co".to_string(), "detik.com".to_string()]
        );
        assert!(config.source.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvester.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
interval-seconds = 30

[output]
database-path = "./news.db"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_hash_tracks_content() {
        let digest = config_hash("[output]\ndatabase-path = \"a.db\"\n");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, config_hash("[output]\ndatabase-path = \"a.db\"\n"));
        assert_ne!(digest, config_hash("[output]\ndatabase-path = \"b.db\"\n"));
    }

    #[test]
    fn test_load_config_with_hash() {
        let content = "[output]\ndatabase-path = \"./news.db\"\n";
        let file = create_temp_config(content);

        let (config, digest) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.output.database_path, "./news.db");
        assert_eq!(digest, config_hash(content));
    }
}
