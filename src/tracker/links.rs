//! Per-URL reachability cache

use crate::crawler::FetchError;
use crate::state::LinkState;
use crate::storage::{lock, LinkStatusRecord, SharedStorage, Storage, StorageResult};
use std::collections::HashMap;

/// Remembers which article URLs failed so later cycles can skip them
///
/// A URL without a record is active.
#[derive(Clone)]
pub struct LinkStatusStore {
    storage: SharedStorage,
}

impl LinkStatusStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Whether `url` may be fetched
    pub fn is_active(&self, url: &str) -> StorageResult<bool> {
        let storage = lock(&self.storage)?;
        Ok(storage
            .get_link_status(url)?
            .map(|record| record.state.is_active())
            .unwrap_or(true))
    }

    /// Records a failed fetch of `url`
    pub fn mark_failed(&self, url: &str, error: &FetchError, source: Option<&str>) -> StorageResult<()> {
        let mut storage = lock(&self.storage)?;
        storage.record_link_failure(url, error.link_state(), &error.reason(), source)
    }

    /// Records a successful fetch of `url`
    pub fn mark_active(&self, url: &str) -> StorageResult<()> {
        let mut storage = lock(&self.storage)?;
        storage.record_link_success(url)
    }

    /// Forgets one URL, or every URL when `url` is `None`
    ///
    /// Returns how many records were removed.
    pub fn reset(&self, url: Option<&str>) -> StorageResult<usize> {
        let mut storage = lock(&self.storage)?;
        match url {
            Some(url) => Ok(usize::from(storage.delete_link_status(url)?)),
            None => storage.clear_link_statuses(),
        }
    }

    pub fn status(&self, url: &str) -> StorageResult<Option<LinkStatusRecord>> {
        lock(&self.storage)?.get_link_status(url)
    }

    /// Number of URLs currently not active
    pub fn inactive_link_count(&self) -> StorageResult<u64> {
        let counts = self.counts_by_state()?;
        Ok(counts
            .iter()
            .filter(|(state, _)| !state.is_active())
            .map(|(_, count)| count)
            .sum())
    }

    pub fn inactive_links_for_source(&self, source: &str) -> StorageResult<Vec<LinkStatusRecord>> {
        lock(&self.storage)?.list_failed_links(Some(source))
    }

    pub fn counts_by_state(&self) -> StorageResult<HashMap<LinkState, u64>> {
        lock(&self.storage)?.count_links_by_state()
    }
}
