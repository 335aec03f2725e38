//! Source health state machine
//!
//! A source stays active while it keeps producing articles. Three consecutive
//! failed cycles deactivate it; one successful cycle (or a manual reactivation)
//! fully resets it.

use chrono::{DateTime, Utc};

/// Consecutive failures after which a source is deactivated
pub const FAILURE_THRESHOLD: u32 = 3;

/// Reason recorded when a crawl finishes without error but yields nothing
pub const NO_ARTICLES_REASON: &str = "No articles found";

/// Health fields persisted with each source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHealth {
    pub active: bool,
    pub consecutive_failures: u32,
    pub last_successful_crawl: Option<DateTime<Utc>>,
    pub last_crawl_article_count: u32,
    pub failure_reason: Option<String>,
    pub inactivity_detected_at: Option<DateTime<Utc>>,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            active: true,
            consecutive_failures: 0,
            last_successful_crawl: None,
            last_crawl_article_count: 0,
            failure_reason: None,
            inactivity_detected_at: None,
        }
    }
}

impl SourceHealth {
    /// Applies one crawl result. Returns true if this result deactivated the source.
    pub fn record_result(
        &mut self,
        articles_count: u32,
        failure_reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if articles_count > 0 {
            self.record_success(articles_count, now);
            false
        } else {
            self.record_failure(failure_reason.unwrap_or(NO_ARTICLES_REASON), now)
        }
    }

    pub fn record_success(&mut self, articles_count: u32, now: DateTime<Utc>) {
        self.active = true;
        self.consecutive_failures = 0;
        self.last_successful_crawl = Some(now);
        self.last_crawl_article_count = articles_count;
        self.failure_reason = None;
        self.inactivity_detected_at = None;
    }

    /// Returns true if the failure crossed the threshold on this call
    pub fn record_failure(&mut self, reason: &str, now: DateTime<Utc>) -> bool {
        let was_active = self.active;

        self.consecutive_failures += 1;
        self.last_crawl_article_count = 0;
        self.failure_reason = Some(reason.to_string());

        if self.consecutive_failures >= FAILURE_THRESHOLD {
            self.active = false;
            if self.inactivity_detected_at.is_none() {
                self.inactivity_detected_at = Some(now);
            }
        }

        was_active && !self.active
    }

    /// Forces the source back to a healthy state
    pub fn reactivate(&mut self) {
        self.active = true;
        self.consecutive_failures = 0;
        self.failure_reason = None;
        self.inactivity_detected_at = None;
    }

    /// "active" or "inactive", as reported in health snapshots
    pub fn status_str(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }
}
