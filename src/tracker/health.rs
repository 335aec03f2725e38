//! Per-source health tracking on top of the `SourceHealth` state machine

use crate::state::SourceHealth;
use crate::storage::{lock, SharedStorage, SourceRecord, Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health of one source, as reported to operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub consecutive_failures: u32,
    pub failure_reason: Option<String>,
    pub last_successful_crawl: Option<DateTime<Utc>>,
    pub last_crawl_article_count: u32,
    pub inactivity_detected_at: Option<DateTime<Utc>>,
    pub status: &'static str,
}

impl From<&SourceRecord> for HealthSnapshot {
    fn from(source: &SourceRecord) -> Self {
        let health = &source.health;
        Self {
            id: source.id,
            name: source.name.clone(),
            active: health.active,
            consecutive_failures: health.consecutive_failures,
            failure_reason: health.failure_reason.clone(),
            last_successful_crawl: health.last_successful_crawl,
            last_crawl_article_count: health.last_crawl_article_count,
            inactivity_detected_at: health.inactivity_detected_at,
            status: health.status_str(),
        }
    }
}

/// Health of every non-deleted source
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub sources: Vec<HealthSnapshot>,
}

#[derive(Clone)]
pub struct SourceHealthTracker {
    storage: SharedStorage,
}

impl SourceHealthTracker {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Applies the result of one crawl attempt to a source and persists it
    pub fn record_crawl_result(
        &self,
        source_id: i64,
        articles_count: u32,
        failure_reason: Option<&str>,
    ) -> StorageResult<SourceHealth> {
        let mut storage = lock(&self.storage)?;
        let source = storage
            .get_source(source_id)?
            .ok_or(StorageError::SourceNotFound(source_id))?;

        let mut health = source.health;
        let deactivated = health.record_result(articles_count, failure_reason, Utc::now());
        storage.save_source_health(source_id, &health)?;

        if deactivated {
            tracing::warn!(
                "Source '{}' deactivated after {} consecutive failures: {}",
                source.name,
                health.consecutive_failures,
                health.failure_reason.as_deref().unwrap_or("unknown")
            );
        } else if articles_count == 0 {
            tracing::info!(
                "Source '{}' failed ({} consecutive)",
                source.name,
                health.consecutive_failures
            );
        }

        Ok(health)
    }

    /// Forces a source back to active
    pub fn reactivate(&self, source_id: i64) -> StorageResult<SourceHealth> {
        let mut storage = lock(&self.storage)?;
        let source = storage
            .get_source(source_id)?
            .ok_or(StorageError::SourceNotFound(source_id))?;

        let mut health = source.health;
        health.reactivate();
        storage.save_source_health(source_id, &health)?;

        tracing::info!("Source '{}' manually reactivated", source.name);
        Ok(health)
    }

    pub fn snapshot(&self, source_id: i64) -> StorageResult<HealthSnapshot> {
        let storage = lock(&self.storage)?;
        storage
            .get_source(source_id)?
            .map(|source| HealthSnapshot::from(&source))
            .ok_or(StorageError::SourceNotFound(source_id))
    }

    pub fn report(&self) -> StorageResult<HealthReport> {
        let sources = lock(&self.storage)?.list_sources()?;
        let snapshots: Vec<HealthSnapshot> = sources.iter().map(HealthSnapshot::from).collect();
        let active = snapshots.iter().filter(|s| s.active).count();

        Ok(HealthReport {
            total: snapshots.len(),
            active,
            inactive: snapshots.len() - active,
            sources: snapshots,
        })
    }
}
