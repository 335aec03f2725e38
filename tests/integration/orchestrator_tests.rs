//! Integration tests for the crawl orchestrator
//!
//! Cycle serialization, scheduler control and the effects of a cycle on
//! source health and stored articles.

use chrono::{Duration as ChronoDuration, Utc};
use news_harvester::config::{parse_config, Config};
use news_harvester::enrich::SentimentScore;
use news_harvester::orchestrator::{CrawlStatus, OrchestratorError, SchedulerTransition};
use news_harvester::state::{CrawlType, SourceConfig};
use news_harvester::storage::{lock, shared, ArticleRecord, NewSource, SharedStorage, SqliteStorage, Storage};
use news_harvester::CrawlOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    parse_config(
        r#"
[crawler]
interval-seconds = 3600
retention-days = 30

[http]
probe-timeout-secs = 2
index-timeout-secs = 5
content-timeout-secs = 5

[output]
database-path = "unused.db"
"#,
    )
    .expect("test config")
}

fn test_storage() -> SharedStorage {
    shared(SqliteStorage::new_in_memory().expect("in-memory storage"))
}

fn add_rss_source(storage: &SharedStorage, name: &str, feed_url: String) -> i64 {
    lock(storage)
        .unwrap()
        .insert_source(&NewSource {
            name: name.to_string(),
            base_url: feed_url.trim_end_matches("/rss").to_string(),
            crawl_type: CrawlType::Rss,
            config: SourceConfig {
                rss_url: Some(feed_url),
                ..SourceConfig::default()
            },
            active: true,
            auto_detect: false,
        })
        .unwrap()
}

fn feed_with(base: &str, route: &str, title: &str) -> String {
    let body: String = (0..5)
        .map(|i| format!("Paragraf {} tentang perbaikan jalan provinsi di Lampung Selatan. ", i))
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel>
        <item><title>{}</title><link>{}{}</link><description>{}</description></item>
        </channel></rss>"#,
        title, base, route, body
    )
}

async fn mount_feed(server: &MockServer, route: &str, feed: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed).set_delay(delay))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_manual_crawls_never_overlap() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_feed(
        &server,
        "/rss",
        feed_with(&base, "/berita/jalan-provinsi", "Perbaikan Jalan Provinsi Dikebut"),
        Duration::from_millis(300),
    )
    .await;

    let storage = test_storage();
    add_rss_source(&storage, "Kabar Selatan", format!("{}/rss", base));
    let orchestrator = CrawlOrchestrator::new(&test_config(), storage.clone()).unwrap();

    let (a, b) = tokio::join!(orchestrator.manual_crawl(), orchestrator.manual_crawl());
    let (first, second) = if a.crawl_number < b.crawl_number { (a, b) } else { (b, a) };

    assert_eq!((first.crawl_number, second.crawl_number), (1, 2));
    assert!(second.started_at >= first.finished_at);
    assert_eq!(first.status, CrawlStatus::Success);
    assert_eq!(first.articles_count, 1);
    assert_eq!(second.articles_count, 1);

    // Re-crawling the same URL overwrites the row.
    assert_eq!(lock(&storage).unwrap().count_articles().unwrap(), 1);

    let status = orchestrator.status();
    assert_eq!(status.total_crawls, 2);
    assert!(status.last_crawl_time.is_some());
    assert!(!status.auto_running);
}

#[tokio::test]
async fn test_update_interval_bounds() {
    let orchestrator = CrawlOrchestrator::new(&test_config(), test_storage()).unwrap();

    assert_eq!(
        orchestrator.update_interval(30),
        Err(OrchestratorError::IntervalOutOfRange {
            seconds: 30,
            min: 60,
            max: 86_400
        })
    );
    assert!(orchestrator.update_interval(100_000).is_err());
    assert_eq!(orchestrator.status().interval_seconds, 3600);

    assert!(orchestrator.update_interval(7200).is_ok());
    assert_eq!(orchestrator.status().interval_seconds, 7200);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let orchestrator = CrawlOrchestrator::new(&test_config(), test_storage()).unwrap();

    assert_eq!(orchestrator.stop_auto(), SchedulerTransition::AlreadyStopped);
    assert!(orchestrator.start_auto(10).is_err());

    assert_eq!(orchestrator.start_auto(3600), Ok(SchedulerTransition::Started));
    assert_eq!(orchestrator.start_auto(3600), Ok(SchedulerTransition::AlreadyRunning));

    let status = orchestrator.status();
    assert!(status.auto_running);
    assert!(status.scheduler_running);
    assert_eq!(status.total_crawls, 0);

    assert_eq!(orchestrator.stop_auto(), SchedulerTransition::Stopped);
    assert_eq!(orchestrator.stop_auto(), SchedulerTransition::AlreadyStopped);
    assert!(!orchestrator.status().auto_running);

    orchestrator.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_runs_cycles_and_reschedules_in_place() {
    // No sources: cycles touch only storage, so paused time is safe.
    let orchestrator = CrawlOrchestrator::new(&test_config(), test_storage()).unwrap();
    orchestrator.start_auto(60).unwrap();

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(orchestrator.status().total_crawls, 1);

    orchestrator.update_interval(7200).unwrap();
    assert!(orchestrator.status().scheduler_running);

    // The old interval would have fired long before this.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(orchestrator.status().total_crawls, 1);

    tokio::time::sleep(Duration::from_secs(3601)).await;
    assert_eq!(orchestrator.status().total_crawls, 2);

    orchestrator.shutdown().await;
    assert!(!orchestrator.status().auto_running);
}

#[tokio::test]
async fn test_failing_source_is_deactivated_after_three_cycles() {
    let server = MockServer::start().await;
    let storage = test_storage();
    let id = add_rss_source(&storage, "Kabar Mati", format!("{}/rss", server.uri()));
    let orchestrator = CrawlOrchestrator::new(&test_config(), storage.clone()).unwrap();

    for _ in 0..2 {
        let report = orchestrator.manual_crawl().await;
        assert!(report.is_success());
        assert_eq!(report.articles_count, 0);
    }
    let health = orchestrator.health().snapshot(id).unwrap();
    assert!(health.active);
    assert_eq!(health.consecutive_failures, 2);
    assert_eq!(health.failure_reason.as_deref(), Some("Fetch failed: HTTP status 404"));

    orchestrator.manual_crawl().await;
    let health = orchestrator.health().snapshot(id).unwrap();
    assert!(!health.active);
    assert_eq!(health.status, "inactive");
    let detected_at = health.inactivity_detected_at.expect("deactivation time");

    // Inactive sources are skipped, so nothing changes on the next cycle.
    orchestrator.manual_crawl().await;
    let health = orchestrator.health().snapshot(id).unwrap();
    assert_eq!(health.consecutive_failures, 3);
    assert_eq!(health.inactivity_detected_at, Some(detected_at));

    orchestrator.health().reactivate(id).unwrap();
    assert!(orchestrator.health().snapshot(id).unwrap().active);
}

#[tokio::test]
async fn test_duplicate_urls_across_sources_are_stored_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let title = "Gubernur Resmikan Jalan Tol Baru";
    mount_feed(&server, "/a/rss", feed_with(&base, "/berita/tol", title), Duration::ZERO).await;
    mount_feed(&server, "/b/rss", feed_with(&base, "/berita/tol", title), Duration::ZERO).await;

    let storage = test_storage();
    let a = add_rss_source(&storage, "Kabar A", format!("{}/a/rss", base));
    let b = add_rss_source(&storage, "Kabar B", format!("{}/b/rss", base));
    let orchestrator = CrawlOrchestrator::new(&test_config(), storage.clone()).unwrap();

    let report = orchestrator.manual_crawl().await;
    assert_eq!(report.articles_count, 1);
    assert_eq!(report.message, "Crawl completed: 1 articles from 2 sources");

    // Both sources found the article, so both stay healthy.
    for id in [a, b] {
        let health = orchestrator.health().snapshot(id).unwrap();
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.last_crawl_article_count, 1);
    }

    let article = lock(&storage)
        .unwrap()
        .get_article(&format!("{}/berita/tol", base))
        .unwrap()
        .unwrap();
    assert_eq!(article.source, "Kabar A");
    assert_eq!(article.sentiment.label, "neutral");
    assert!(article.keywords.contains("jalan"));
}

#[tokio::test]
async fn test_cycle_purges_expired_articles() {
    let storage = test_storage();
    let now = Utc::now();
    {
        let mut storage = lock(&storage).unwrap();
        for (url, age_days) in [("https://a.id/berita/lama", 45), ("https://a.id/berita/baru", 2)] {
            storage
                .upsert_article(&ArticleRecord {
                    url: url.to_string(),
                    title: "Judul".to_string(),
                    source: "A".to_string(),
                    content: "Isi".to_string(),
                    keywords: String::new(),
                    sentiment: SentimentScore::neutral(),
                    crawled_date: now - ChronoDuration::days(age_days),
                })
                .unwrap();
        }
    }
    let orchestrator = CrawlOrchestrator::new(&test_config(), storage.clone()).unwrap();

    assert!(orchestrator.manual_crawl().await.is_success());

    let storage = lock(&storage).unwrap();
    assert_eq!(storage.count_articles().unwrap(), 1);
    assert!(storage.get_article("https://a.id/berita/baru").unwrap().is_some());
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_cycle() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_feed(
        &server,
        "/rss",
        feed_with(&base, "/berita/jalan-provinsi", "Perbaikan Jalan Provinsi Dikebut"),
        Duration::from_millis(400),
    )
    .await;

    let storage = test_storage();
    add_rss_source(&storage, "Kabar Selatan", format!("{}/rss", base));
    let orchestrator = Arc::new(CrawlOrchestrator::new(&test_config(), storage.clone()).unwrap());

    let background = orchestrator.clone();
    let crawl = tokio::spawn(async move { background.manual_crawl().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    orchestrator.shutdown().await;
    assert_eq!(orchestrator.status().total_crawls, 1);
    assert_eq!(lock(&storage).unwrap().count_articles().unwrap(), 1);

    assert!(crawl.await.unwrap().is_success());
}
