//! Storage module for persisting harvest data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Source records with their health fields
//! - Article upserts keyed on URL, retention cleanup
//! - Per-URL link status

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::enrich::SentimentScore;
use crate::state::{CrawlType, LinkState, SourceConfig, SourceHealth};
use crate::HarvestError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared by the orchestrator, the trackers and the extractor
///
/// Guards are never held across an `.await`.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing between tasks
pub fn shared(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage, mapping a poisoned lock to a storage error
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage
        .lock()
        .map_err(|_| StorageError::Database("lock poisoned".to_string()))
}

/// A news source as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    pub crawl_type: CrawlType,
    pub config: SourceConfig,
    pub auto_detect: bool,
    pub health: SourceHealth,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SourceRecord {
    pub fn is_active(&self) -> bool {
        self.health.active && self.deleted_at.is_none()
    }
}

/// Fields needed to create a source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub base_url: String,
    pub crawl_type: CrawlType,
    pub config: SourceConfig,
    pub active: bool,
    pub auto_detect: bool,
}

/// Partial update of a source; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub crawl_type: Option<CrawlType>,
    pub config: Option<SourceConfig>,
    pub active: Option<bool>,
    pub auto_detect: Option<bool>,
}

/// A harvested article
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub source: String,
    pub content: String,
    pub keywords: String,
    pub sentiment: SentimentScore,
    pub crawled_date: DateTime<Utc>,
}

/// Whether an upsert created a row or overwrote one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Stored reachability of one article URL
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatusRecord {
    pub url: String,
    pub state: LinkState,
    pub failure_count: u32,
    pub last_checked: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub source: Option<String>,
}

/// Formats a timestamp for storage
///
/// Fixed precision keeps stored values lexicographically ordered.
pub fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp
pub fn from_db_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
