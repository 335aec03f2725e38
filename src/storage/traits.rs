//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{LinkState, SourceHealth};
use crate::storage::{
    ArticleRecord, LinkStatusRecord, NewSource, SourceRecord, SourceUpdate, UpsertOutcome,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers the three persisted collections: sources (with their health fields),
/// articles (unique by URL) and per-URL link status.
pub trait Storage {
    // ===== Sources =====

    /// Inserts a new source and returns its ID
    fn insert_source(&mut self, source: &NewSource) -> StorageResult<i64>;

    /// Gets a source by ID, including soft-deleted ones
    fn get_source(&self, id: i64) -> StorageResult<Option<SourceRecord>>;

    /// Gets a source by exact name, including soft-deleted ones
    fn get_source_by_name(&self, name: &str) -> StorageResult<Option<SourceRecord>>;

    /// Lists all sources that have not been soft-deleted
    fn list_sources(&self) -> StorageResult<Vec<SourceRecord>>;

    /// Lists sources that are active and not deleted, in ID order
    fn list_active_sources(&self) -> StorageResult<Vec<SourceRecord>>;

    /// Lists sources that are inactive and not deleted
    fn list_inactive_sources(&self) -> StorageResult<Vec<SourceRecord>>;

    /// Applies a partial update. Returns false if the source does not exist.
    fn update_source(&mut self, id: i64, update: &SourceUpdate) -> StorageResult<bool>;

    /// Persists the health fields of a source
    fn save_source_health(&mut self, id: i64, health: &SourceHealth) -> StorageResult<()>;

    /// Marks a source deleted. Returns false if it was missing or already deleted.
    fn soft_delete_source(&mut self, id: i64) -> StorageResult<bool>;

    // ===== Articles =====

    /// Inserts an article or overwrites the existing row with the same URL
    fn upsert_article(&mut self, article: &ArticleRecord) -> StorageResult<UpsertOutcome>;

    /// Gets an article by URL
    fn get_article(&self, url: &str) -> StorageResult<Option<ArticleRecord>>;

    /// Counts all stored articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Deletes articles crawled before `cutoff`, returning how many were removed
    fn delete_articles_before(&mut self, cutoff: DateTime<Utc>) -> StorageResult<usize>;

    /// Newest `crawled_date` across all articles
    fn latest_crawled_date(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Counts articles whose `crawled_date` lies within `[from, to]`
    fn count_articles_between(&self, from: DateTime<Utc>, to: DateTime<Utc>)
        -> StorageResult<u64>;

    // ===== Link status =====

    /// Gets the status record for a URL; `None` means never failed
    fn get_link_status(&self, url: &str) -> StorageResult<Option<LinkStatusRecord>>;

    /// Upserts a failed fetch: sets the state and reason and increments the failure count
    fn record_link_failure(
        &mut self,
        url: &str,
        state: LinkState,
        reason: &str,
        source: Option<&str>,
    ) -> StorageResult<()>;

    /// Flips an existing record back to active with a zero failure count
    fn record_link_success(&mut self, url: &str) -> StorageResult<()>;

    /// Deletes the status record of one URL
    fn delete_link_status(&mut self, url: &str) -> StorageResult<bool>;

    /// Deletes every status record, returning how many were removed
    fn clear_link_statuses(&mut self) -> StorageResult<usize>;

    /// Counts status records per state
    fn count_links_by_state(&self) -> StorageResult<HashMap<LinkState, u64>>;

    /// Lists records not in the active state, optionally restricted to one source
    fn list_failed_links(&self, source: Option<&str>) -> StorageResult<Vec<LinkStatusRecord>>;
}
