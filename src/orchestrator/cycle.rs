//! One crawl cycle over every active source

use super::{CrawlReport, CrawlStatus, Shared};
use crate::storage::{lock, ArticleRecord, Storage};
use crate::strategy::HarvestedArticle;
use crate::HarvestError;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use tokio::sync::MutexGuard;

/// Failure reasons stored on sources are cut to this many characters
const MAX_REASON_CHARS: usize = 100;

#[derive(Debug, Default)]
struct CycleSummary {
    sources: usize,
    stored: usize,
    failed_sources: usize,
    purged: usize,
}

impl Shared {
    /// Waits for the cycle lock, runs a cycle and records it
    pub(super) async fn locked_cycle(&self) -> CrawlReport {
        let guard = self.cycle_lock.lock().await;
        self.cycle_under_lock(guard).await
    }

    /// Runs a cycle while holding `_guard`, then records it
    ///
    /// Only completed cycles advance the crawl count and last crawl time; a failed
    /// cycle reports the count as it stands.
    pub(super) async fn cycle_under_lock(&self, _guard: MutexGuard<'_, ()>) -> CrawlReport {
        let started_at = Utc::now();

        let result = self.run_cycle().await;
        let finished_at = Utc::now();

        let crawl_number = {
            let mut counters = self.counters();
            if result.is_ok() {
                counters.total_crawls += 1;
                counters.last_crawl_time = Some(finished_at);
            }
            counters.total_crawls
        };

        match result {
            Ok(summary) => {
                tracing::info!(
                    "Crawl #{} completed: {} articles from {} sources ({} failed, {} purged)",
                    crawl_number,
                    summary.stored,
                    summary.sources,
                    summary.failed_sources,
                    summary.purged
                );
                CrawlReport {
                    status: CrawlStatus::Success,
                    message: format!(
                        "Crawl completed: {} articles from {} sources",
                        summary.stored, summary.sources
                    ),
                    articles_count: summary.stored,
                    crawl_number,
                    timestamp: finished_at,
                    started_at,
                    finished_at,
                }
            }
            Err(e) => {
                tracing::error!("Crawl #{} failed: {}", crawl_number, e);
                CrawlReport {
                    status: CrawlStatus::Error,
                    message: format!("Crawl failed: {}", e),
                    articles_count: 0,
                    crawl_number,
                    timestamp: finished_at,
                    started_at,
                    finished_at,
                }
            }
        }
    }

    /// Crawls active sources one after another
    ///
    /// A failing source is recorded against its own health and never stops the
    /// cycle; only storage failures outside a single source abort it.
    async fn run_cycle(&self) -> crate::Result<CycleSummary> {
        let sources = lock(&self.storage)?.list_active_sources()?;
        tracing::info!("Starting crawl cycle over {} active sources", sources.len());

        let mut summary = CycleSummary {
            sources: sources.len(),
            ..CycleSummary::default()
        };
        let mut seen = HashSet::new();

        for source in &sources {
            let (articles, failure_reason) = match self.engine.crawl_source(source).await {
                Ok(articles) => (articles, None),
                Err(e) => {
                    tracing::warn!("Crawling {} failed: {}", source.name, e);
                    (Vec::new(), Some(failure_reason(&e)))
                }
            };

            let found = u32::try_from(articles.len()).unwrap_or(u32::MAX);
            if let Err(e) =
                self.health
                    .record_crawl_result(source.id, found, failure_reason.as_deref())
            {
                tracing::error!("Could not record health for {}: {}", source.name, e);
            }
            if found == 0 {
                summary.failed_sources += 1;
                continue;
            }

            let mut stored = 0;
            for article in articles {
                if !seen.insert(article.url.clone()) {
                    tracing::debug!("Duplicate article across sources: {}", article.url);
                    continue;
                }
                match self.store(article) {
                    Ok(()) => stored += 1,
                    Err(e) => tracing::warn!("Could not store article from {}: {}", source.name, e),
                }
            }
            tracing::info!("{}: {} articles stored", source.name, stored);
            summary.stored += stored;
        }

        summary.purged = self.purge_expired()?;
        Ok(summary)
    }

    /// Enriches an article and upserts it by URL
    fn store(&self, article: HarvestedArticle) -> crate::Result<()> {
        let text = format!("{}\n{}", article.title, article.content);
        let record = ArticleRecord {
            sentiment: self.tagger.tag(&text),
            keywords: self.keywords.extract(&article.title, &article.content),
            url: article.url,
            title: article.title,
            source: article.source,
            content: article.content,
            crawled_date: Utc::now(),
        };
        lock(&self.storage)?.upsert_article(&record)?;
        Ok(())
    }

    fn purge_expired(&self) -> crate::Result<usize> {
        if self.retention_days == 0 {
            return Ok(0);
        }
        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let purged = lock(&self.storage)?.delete_articles_before(cutoff)?;
        if purged > 0 {
            tracing::info!("Purged {} articles older than {} days", purged, self.retention_days);
        }
        Ok(purged)
    }
}

fn failure_reason(error: &HarvestError) -> String {
    error.to_string().chars().take(MAX_REASON_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchError;

    #[test]
    fn test_failure_reason_is_truncated() {
        let long = HarvestError::Feed("x".repeat(300));
        assert_eq!(failure_reason(&long).chars().count(), MAX_REASON_CHARS);

        let fetch = HarvestError::Fetch(FetchError::Http { status: 503 });
        assert_eq!(failure_reason(&fetch), "Fetch failed: HTTP status 503");
    }
}
