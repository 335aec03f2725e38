//! Crawl orchestration
//!
//! [`CrawlOrchestrator`] owns the interval scheduler and the cycle lock. Manual
//! and scheduled crawls both go through the same locked cycle, so at most one
//! cycle is in flight at any time.

mod cycle;
mod scheduler;

use crate::config::Config;
use crate::crawler::build_http_client;
use crate::enrich::{FrequencyKeywords, KeywordExtractor, NeutralTagger, Tagger};
use crate::sources::SourceCatalog;
use crate::storage::SharedStorage;
use crate::strategy::CrawlEngine;
use crate::tracker::{LinkStatusStore, SourceHealthTracker};
use chrono::{DateTime, Utc};
use scheduler::{SchedulerCommand, SchedulerHandle};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Shortest accepted crawl interval
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Longest accepted crawl interval
pub const MAX_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("interval must be between {min} and {max} seconds, got {seconds}")]
    IntervalOutOfRange { seconds: u64, min: u64, max: u64 },
}

/// Validates a crawl interval in seconds
pub fn check_interval(seconds: u64) -> Result<Duration, OrchestratorError> {
    if (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&seconds) {
        Ok(Duration::from_secs(seconds))
    } else {
        Err(OrchestratorError::IntervalOutOfRange {
            seconds,
            min: MIN_INTERVAL_SECS,
            max: MAX_INTERVAL_SECS,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Success,
    Error,
}

/// Outcome of one crawl cycle
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub status: CrawlStatus,
    pub message: String,
    pub articles_count: usize,
    /// Completed cycles so far; a failed cycle does not advance it
    pub crawl_number: u64,
    pub timestamp: DateTime<Utc>,
    /// When the cycle acquired the lock
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn is_success(&self) -> bool {
        self.status == CrawlStatus::Success
    }
}

/// Snapshot of the scheduler and cycle counters
#[derive(Debug, Clone, Serialize)]
pub struct AutoCrawlStatus {
    pub auto_running: bool,
    pub interval_seconds: u64,
    pub last_crawl_time: Option<DateTime<Utc>>,
    pub total_crawls: u64,
    /// Whether the scheduler task is still alive
    pub scheduler_running: bool,
    pub timestamp: DateTime<Utc>,
}

/// Result of a start or stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerTransition {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
}

impl SchedulerTransition {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Started => "Auto crawling started",
            Self::AlreadyRunning => "Auto crawling is already running",
            Self::Stopped => "Auto crawling stopped",
            Self::AlreadyStopped => "Auto crawling is not running",
        }
    }

    /// False when the scheduler was already in the requested state
    pub fn changed(&self) -> bool {
        matches!(self, Self::Started | Self::Stopped)
    }
}

#[derive(Debug)]
struct Counters {
    interval_seconds: u64,
    last_crawl_time: Option<DateTime<Utc>>,
    total_crawls: u64,
}

struct Shared {
    engine: CrawlEngine,
    storage: SharedStorage,
    health: SourceHealthTracker,
    tagger: Arc<dyn Tagger>,
    keywords: Arc<dyn KeywordExtractor>,
    retention_days: u32,
    cycle_lock: tokio::sync::Mutex<()>,
    counters: Mutex<Counters>,
}

impl Shared {
    fn counters(&self) -> MutexGuard<'_, Counters> {
        // Counters hold plain values; a poisoned guard is still consistent.
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runs crawl cycles on demand and on an interval
///
/// Construct once at startup and share by reference; cloning is not needed
/// because every operation takes `&self`.
pub struct CrawlOrchestrator {
    shared: Arc<Shared>,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl CrawlOrchestrator {
    /// Builds an orchestrator with the default enrichment collaborators
    pub fn new(config: &Config, storage: SharedStorage) -> crate::Result<Self> {
        let client = build_http_client(&config.http)?;
        let engine = CrawlEngine::new(config, client, storage.clone());
        Ok(Self::with_engine(
            config,
            engine,
            storage,
            Arc::new(NeutralTagger),
            Arc::new(FrequencyKeywords::default()),
        ))
    }

    pub fn with_engine(
        config: &Config,
        engine: CrawlEngine,
        storage: SharedStorage,
        tagger: Arc<dyn Tagger>,
        keywords: Arc<dyn KeywordExtractor>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                health: SourceHealthTracker::new(storage.clone()),
                storage,
                tagger,
                keywords,
                retention_days: config.crawler.retention_days,
                cycle_lock: tokio::sync::Mutex::new(()),
                counters: Mutex::new(Counters {
                    interval_seconds: config.crawler.interval_seconds,
                    last_crawl_time: None,
                    total_crawls: 0,
                }),
            }),
            scheduler: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.shared.storage
    }

    pub fn health(&self) -> &SourceHealthTracker {
        &self.shared.health
    }

    pub fn links(&self) -> &LinkStatusStore {
        &self.shared.engine.context().links
    }

    /// Source management backed by the same storage and detector
    pub fn sources(&self) -> SourceCatalog {
        SourceCatalog::new(
            self.shared.storage.clone(),
            self.shared.engine.detector().clone(),
        )
    }

    /// Runs one full cycle now, waiting for any cycle already in flight
    ///
    /// Never fails: an error inside the cycle is reported as an error-status
    /// [`CrawlReport`].
    pub async fn manual_crawl(&self) -> CrawlReport {
        tracing::info!("Manual crawl requested");
        self.shared.locked_cycle().await
    }

    /// Starts the interval scheduler
    ///
    /// The first scheduled cycle runs one interval from now. Must be called
    /// from within a Tokio runtime.
    pub fn start_auto(&self, interval_seconds: u64) -> Result<SchedulerTransition, OrchestratorError> {
        let interval = check_interval(interval_seconds)?;
        let mut scheduler = self.scheduler_slot();

        if scheduler.as_ref().is_some_and(SchedulerHandle::is_alive) {
            return Ok(SchedulerTransition::AlreadyRunning);
        }

        self.shared.counters().interval_seconds = interval_seconds;
        *scheduler = Some(SchedulerHandle::spawn(self.shared.clone(), interval));
        tracing::info!("Auto crawling started, interval {}s", interval_seconds);
        Ok(SchedulerTransition::Started)
    }

    /// Stops the interval scheduler
    ///
    /// A scheduled cycle already in flight finishes in the background.
    pub fn stop_auto(&self) -> SchedulerTransition {
        match self.scheduler_slot().take() {
            Some(handle) if handle.is_alive() => {
                handle.send(SchedulerCommand::Stop);
                tracing::info!("Auto crawling stopped");
                SchedulerTransition::Stopped
            }
            _ => SchedulerTransition::AlreadyStopped,
        }
    }

    /// Changes the crawl interval
    ///
    /// A running scheduler is rescheduled in place: its next cycle runs one new
    /// interval from now.
    pub fn update_interval(&self, seconds: u64) -> Result<(), OrchestratorError> {
        let interval = check_interval(seconds)?;
        self.shared.counters().interval_seconds = seconds;

        if let Some(handle) = self.scheduler_slot().as_ref() {
            handle.send(SchedulerCommand::Run { interval });
            tracing::info!("Crawl interval updated to {}s, scheduler rescheduled", seconds);
        } else {
            tracing::info!("Crawl interval updated to {}s", seconds);
        }
        Ok(())
    }

    pub fn status(&self) -> AutoCrawlStatus {
        let (auto_running, scheduler_running) = match self.scheduler_slot().as_ref() {
            Some(handle) => (true, handle.is_alive()),
            None => (false, false),
        };
        let counters = self.shared.counters();

        AutoCrawlStatus {
            auto_running,
            interval_seconds: counters.interval_seconds,
            last_crawl_time: counters.last_crawl_time,
            total_crawls: counters.total_crawls,
            scheduler_running,
            timestamp: Utc::now(),
        }
    }

    /// Stops the scheduler and waits for any in-flight cycle to finish
    pub async fn shutdown(&self) {
        let handle = self.scheduler_slot().take();
        if let Some(handle) = handle {
            handle.stop_and_join().await;
        }

        let _drained = self.shared.cycle_lock.lock().await;
        tracing::info!("Orchestrator shut down");
    }

    fn scheduler_slot(&self) -> MutexGuard<'_, Option<SchedulerHandle>> {
        self.scheduler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
