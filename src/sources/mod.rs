//! Source management
//!
//! Adding a source runs crawl type detection so the stored record is ready to
//! crawl; everything else is bookkeeping over the storage layer.

use crate::config::SeedSource;
use crate::crawler::CrawlTypeDetector;
use crate::state::{CrawlType, SourceConfig};
use crate::storage::{
    lock, NewSource, SharedStorage, SourceRecord, SourceUpdate, Storage, StorageResult,
};
use crate::url::parse_site_url;
use crate::HarvestError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Articles within this distance of the newest one count as the same crawl
const CRAWL_WINDOW_MINUTES: i64 = 30;

/// A source as requested by an operator, before detection
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub name: String,
    pub base_url: String,
    pub crawl_type: CrawlType,
    pub config: SourceConfig,
    pub auto_detect: bool,
}

impl SourceRequest {
    /// Auto-detected source with no configuration
    pub fn auto(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            crawl_type: CrawlType::Auto,
            config: SourceConfig::default(),
            auto_detect: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcesSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

/// When the newest articles were crawled and how many came with them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastCrawlStatus {
    pub last_crawl_time: DateTime<Utc>,
    pub articles_in_last_crawl: u64,
}

pub struct SourceCatalog {
    storage: SharedStorage,
    detector: CrawlTypeDetector,
}

impl SourceCatalog {
    pub fn new(storage: SharedStorage, detector: CrawlTypeDetector) -> Self {
        Self { storage, detector }
    }

    /// Adds a source, detecting its crawl type when asked to
    ///
    /// Fails with [`HarvestError::RssNotFound`] when the source ends up as an RSS
    /// source and no feed URL was given or could be found.
    pub async fn add_source(&self, request: SourceRequest) -> crate::Result<SourceRecord> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(HarvestError::Validation("source name must not be empty".to_string()));
        }

        let base_url = normalize_base_url(&request.base_url)?;
        let mut crawl_type = request.crawl_type;
        let mut config = request.config;

        if crawl_type == CrawlType::Auto || request.auto_detect {
            tracing::info!("Auto-detecting crawl type for {}", base_url);
            let detection = self.detector.detect(&base_url).await;
            crawl_type = detection.crawl_type;
            config.merge(detection.config);
        }

        match crawl_type {
            CrawlType::Rss if config.rss_url.is_none() => {
                let site = parse_site_url(&base_url)?;
                config.rss_url = self.detector.detect_feeds(&site).await.into_iter().next();
                if config.rss_url.is_none() {
                    return Err(HarvestError::RssNotFound { base_url });
                }
            }
            CrawlType::Html => {
                config.index_url.get_or_insert_with(|| base_url.clone());
            }
            _ => {}
        }
        config.base_url.get_or_insert_with(|| base_url.clone());

        let mut storage = lock(&self.storage)?;
        let id = storage.insert_source(&NewSource {
            name: name.clone(),
            base_url,
            crawl_type,
            config,
            active: true,
            auto_detect: request.auto_detect,
        })?;
        tracing::info!("Created source '{}' with {} crawler", name, crawl_type);

        storage
            .get_source(id)?
            .ok_or(HarvestError::SourceNotFound(id))
    }

    /// Applies a partial update and returns the updated source
    pub fn update_source(&self, id: i64, update: &SourceUpdate) -> crate::Result<SourceRecord> {
        let mut update = update.clone();
        if let Some(base_url) = update.base_url.as_deref() {
            update.base_url = Some(normalize_base_url(base_url)?);
        }

        let mut storage = lock(&self.storage)?;
        if !storage.update_source(id, &update)? {
            return Err(HarvestError::SourceNotFound(id));
        }
        storage.get_source(id)?.ok_or(HarvestError::SourceNotFound(id))
    }

    /// Soft-deletes a source; it is skipped by every later cycle
    pub fn delete_source(&self, id: i64) -> crate::Result<()> {
        if !lock(&self.storage)?.soft_delete_source(id)? {
            return Err(HarvestError::SourceNotFound(id));
        }
        tracing::info!("Source {} deleted", id);
        Ok(())
    }

    pub fn get_source(&self, id: i64) -> crate::Result<SourceRecord> {
        lock(&self.storage)?
            .get_source(id)?
            .filter(|s| s.deleted_at.is_none())
            .ok_or(HarvestError::SourceNotFound(id))
    }

    pub fn list_sources(&self) -> crate::Result<Vec<SourceRecord>> {
        Ok(lock(&self.storage)?.list_sources()?)
    }

    pub fn list_active_sources(&self) -> crate::Result<Vec<SourceRecord>> {
        Ok(lock(&self.storage)?.list_active_sources()?)
    }

    pub fn list_inactive_sources(&self) -> crate::Result<Vec<SourceRecord>> {
        Ok(lock(&self.storage)?.list_inactive_sources()?)
    }

    pub fn summary(&self) -> crate::Result<SourcesSummary> {
        let sources = self.list_sources()?;
        let active = sources.iter().filter(|s| s.is_active()).count();
        Ok(SourcesSummary {
            total: sources.len(),
            active,
            inactive: sources.len() - active,
        })
    }

    /// Inserts configured seed sources that do not exist yet
    ///
    /// A name that was soft-deleted counts as existing, so a deleted seed stays
    /// deleted. Returns how many sources were inserted.
    pub fn seed(&self, seeds: &[SeedSource]) -> crate::Result<usize> {
        let mut storage = lock(&self.storage)?;
        let mut inserted = 0;

        for seed in seeds {
            if storage.get_source_by_name(&seed.name)?.is_some() {
                continue;
            }
            let base_url = normalize_base_url(&seed.base_url)?;
            let mut config = seed.config.clone();
            config.base_url.get_or_insert_with(|| base_url.clone());

            storage.insert_source(&NewSource {
                name: seed.name.clone(),
                base_url,
                crawl_type: seed.crawl_type,
                config,
                active: seed.active,
                auto_detect: seed.auto_detect,
            })?;
            tracing::info!("Seeded source '{}' ({})", seed.name, seed.crawl_type);
            inserted += 1;
        }

        Ok(inserted)
    }

    /// Newest crawl time and the number of articles stored around it
    pub fn last_crawl_status(&self) -> crate::Result<Option<LastCrawlStatus>> {
        let storage = lock(&self.storage)?;
        Ok(last_crawl_status(&*storage)?)
    }
}

/// Newest `crawled_date` and the article count within the crawl window around it
pub fn last_crawl_status(storage: &dyn Storage) -> StorageResult<Option<LastCrawlStatus>> {
    let Some(latest) = storage.latest_crawled_date()? else {
        return Ok(None);
    };

    let window = Duration::minutes(CRAWL_WINDOW_MINUTES);
    let count = storage.count_articles_between(latest - window, latest + window)?;
    Ok(Some(LastCrawlStatus {
        last_crawl_time: latest,
        articles_in_last_crawl: count,
    }))
}

/// Adds `https://` to a bare host and validates the result
fn normalize_base_url(input: &str) -> crate::Result<String> {
    let trimmed = input.trim();
    let url = parse_site_url(trimmed)?;
    if trimmed.contains("://") {
        Ok(trimmed.to_string())
    } else {
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}
