//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock news sites and drive detection,
//! the crawl strategies and link tracking end-to-end.

use news_harvester::config::{parse_config, Config};
use news_harvester::crawler::{build_http_client, CrawlTypeDetector, FetchTimeouts};
use news_harvester::state::{CrawlType, LinkState, SourceConfig};
use news_harvester::storage::{lock, shared, NewSource, SharedStorage, SourceRecord, SqliteStorage, Storage};
use news_harvester::strategy::{CrawlEngine, ListingOverride, StrategyRegistry};
use news_harvester::tracker::LinkStatusStore;
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    parse_config(
        r#"
[crawler]
max-articles-per-source = 10

[http]
probe-timeout-secs = 2
index-timeout-secs = 2
content-timeout-secs = 2

[output]
database-path = "unused.db"
"#,
    )
    .expect("test config")
}

fn test_storage() -> SharedStorage {
    shared(SqliteStorage::new_in_memory().expect("in-memory storage"))
}

fn insert_source(
    storage: &SharedStorage,
    name: &str,
    base_url: &str,
    crawl_type: CrawlType,
    config: SourceConfig,
) -> SourceRecord {
    let mut storage = lock(storage).unwrap();
    let id = storage
        .insert_source(&NewSource {
            name: name.to_string(),
            base_url: base_url.to_string(),
            crawl_type,
            config,
            active: true,
            auto_detect: false,
        })
        .unwrap();
    storage.get_source(id).unwrap().unwrap()
}

fn engine(config: &Config, storage: &SharedStorage) -> CrawlEngine {
    let client = build_http_client(&config.http).unwrap();
    CrawlEngine::new(config, client, storage.clone())
}

fn detector(config: &Config) -> CrawlTypeDetector {
    let client = build_http_client(&config.http).unwrap();
    CrawlTypeDetector::new(client, FetchTimeouts::from_config(&config.http))
}

/// Article body long enough for the extractor and the authenticity filter
fn article_body(topic: &str) -> String {
    (0..6)
        .map(|i| format!("Kalimat ke-{} tentang {} di Bandar Lampung hari ini. ", i, topic))
        .collect()
}

fn article_page(title: &str, topic: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><nav>Beranda</nav><article><h1>{}</h1><p>{}</p></article></body></html>",
        title,
        title,
        article_body(topic)
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn rss_feed(base: &str, items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, route, description)| {
            format!(
                "<item><title>{}</title><link>{}{}</link><description><![CDATA[<p>{}</p>]]></description></item>",
                title, base, route, description
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Kabar</title>{}</channel></rss>"#,
        items
    )
}

#[tokio::test]
async fn test_detector_prefers_rss() {
    let server = MockServer::start().await;
    Mock::given(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
        .mount(&server)
        .await;

    let detection = detector(&test_config()).detect(&server.uri()).await;

    assert_eq!(detection.crawl_type, CrawlType::Rss);
    assert!(detection.detected);
    assert_eq!(detection.config.rss_url, Some(format!("{}/rss", server.uri())));
}

#[tokio::test]
async fn test_detector_finds_sitemap_through_robots() {
    let server = MockServer::start().await;
    let sitemap = format!("{}/peta/berita.xml", server.uri());
    mount_page(
        &server,
        "/robots.txt",
        format!("User-agent: *\nDisallow: /admin\nSitemap: {}\n", sitemap),
    )
    .await;
    Mock::given(path("/peta/berita.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset></urlset>"))
        .mount(&server)
        .await;

    let detection = detector(&test_config()).detect(&server.uri()).await;

    assert_eq!(detection.crawl_type, CrawlType::Sitemap);
    assert_eq!(detection.config.sitemap_url, Some(sitemap));
}

#[tokio::test]
async fn test_detector_falls_back_to_html() {
    let server = MockServer::start().await;

    let detection = detector(&test_config()).detect(&server.uri()).await;

    assert_eq!(detection.crawl_type, CrawlType::Html);
    assert!(!detection.detected);
    assert_eq!(detection.config.index_url, Some(server.uri()));
    assert_eq!(detection.config.base_url, Some(server.uri()));
}

#[tokio::test]
async fn test_rss_source_uses_feed_content() {
    let server = MockServer::start().await;
    let base = server.uri();
    let feed = rss_feed(
        &base,
        &[
            ("Harga Cabai Merah Naik Jelang Ramadan", "/berita/harga-cabai", &article_body("harga cabai")),
            ("Pemprov Resmikan Jembatan Way Sekampung", "/berita/jembatan", &article_body("jembatan baru")),
        ],
    );
    mount_page(&server, "/rss", feed).await;
    Mock::given(method("GET"))
        .and(path("/berita/harga-cabai"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(
        &storage,
        "Kabar Lampung",
        &base,
        CrawlType::Rss,
        SourceConfig {
            rss_url: Some(format!("{}/rss", base)),
            ..SourceConfig::default()
        },
    );

    let articles = engine(&config, &storage).crawl_source(&source).await.unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Harga Cabai Merah Naik Jelang Ramadan");
    assert_eq!(articles[0].source, "Kabar Lampung");
    assert!(articles[0].content.contains("harga cabai"));
}

#[tokio::test]
async fn test_html_source_extracts_articles_and_records_dead_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = r#"<html><body>
        <nav><a href="/berita/menu-navigasi-utama">Menu navigasi utama situs</a></nav>
        <ul>
          <li><a href="/berita/2025/03/banjir-rendam-kemiling">Banjir Rendam Ratusan Rumah di Kemiling</a></li>
          <li><a href="/berita/2025/03/jalan-rusak-natar">Warga Natar Keluhkan Jalan Rusak Parah</a></li>
          <li><a href="/berita/2025/03/pasar-tradisional">Revitalisasi Pasar Tradisional Dimulai Bulan Ini</a></li>
          <li><a href="https://facebook.com/kabarlampung">Ikuti Kabar Lampung di Facebook</a></li>
        </ul>
    </body></html>"#;
    mount_page(&server, "/", index.to_string()).await;
    mount_page(
        &server,
        "/berita/2025/03/banjir-rendam-kemiling",
        article_page("Banjir Rendam Ratusan Rumah di Kemiling", "banjir"),
    )
    .await;
    mount_page(
        &server,
        "/berita/2025/03/jalan-rusak-natar",
        article_page("Warga Natar Keluhkan Jalan Rusak Parah", "jalan rusak"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/berita/2025/03/pasar-tradisional"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(
        &storage,
        "Kabar Lampung",
        &base,
        CrawlType::Html,
        SourceConfig {
            index_url: Some(format!("{}/", base)),
            base_url: Some(base.clone()),
            ..SourceConfig::default()
        },
    );

    let articles = engine(&config, &storage).crawl_source(&source).await.unwrap();

    let mut titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(
        titles,
        vec![
            "Banjir Rendam Ratusan Rumah di Kemiling",
            "Warga Natar Keluhkan Jalan Rusak Parah"
        ]
    );

    let links = LinkStatusStore::new(storage.clone());
    let dead = format!("{}/berita/2025/03/pasar-tradisional", base);
    let status = links.status(&dead).unwrap().expect("dead link recorded");
    assert_eq!(status.state, LinkState::Inactive);
    assert_eq!(status.failure_count, 1);
    assert_eq!(status.failure_reason.as_deref(), Some("HTTP 404 Error"));
    assert_eq!(status.source.as_deref(), Some("Kabar Lampung"));
    assert!(!links.is_active(&dead).unwrap());
    assert_eq!(links.inactive_links_for_source("Kabar Lampung").unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_top_candidates_are_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=6)
        .map(|i| {
            format!(
                r#"<li><a href="/berita/2025/03/kabar-daerah-{}">Kabar Daerah Lampung Nomor {} Hari Ini</a></li>"#,
                i, i
            )
        })
        .collect();
    mount_page(&server, "/", format!("<html><body><ul>{}</ul></body></html>", links)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/berita/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><article><p>Terlalu singkat.</p></article></body></html>",
        ))
        .mount(&server)
        .await;

    let config = parse_config(
        r#"
[crawler]
max-articles-per-source = 2

[http]
probe-timeout-secs = 2
index-timeout-secs = 2
content-timeout-secs = 2

[output]
database-path = "unused.db"
"#,
    )
    .unwrap();
    let storage = test_storage();
    let source = insert_source(
        &storage,
        "Kabar Daerah",
        &base,
        CrawlType::Html,
        SourceConfig {
            index_url: Some(format!("{}/", base)),
            ..SourceConfig::default()
        },
    );

    let articles = engine(&config, &storage).crawl_source(&source).await.unwrap();
    assert!(articles.is_empty());

    let article_fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().starts_with("/berita/"))
        .count();
    assert_eq!(article_fetches, 2);
}

#[tokio::test]
async fn test_source_allowed_domains_admit_external_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = server.address().port();
    // Same server under another host name stands in for a partner site.
    let partner = format!("http://localhost:{}", port);

    let index = format!(
        r#"<html><body><ul>
          <li><a href="/berita/2025/03/banjir-rendam-kemiling">Banjir Rendam Ratusan Rumah di Kemiling</a></li>
          <li><a href="{}/berita/2025/03/jalan-rusak-natar">Warga Natar Keluhkan Jalan Rusak Parah</a></li>
        </ul></body></html>"#,
        partner
    );
    mount_page(&server, "/", index).await;
    mount_page(
        &server,
        "/berita/2025/03/banjir-rendam-kemiling",
        article_page("Banjir Rendam Ratusan Rumah di Kemiling", "banjir"),
    )
    .await;
    mount_page(
        &server,
        "/berita/2025/03/jalan-rusak-natar",
        article_page("Warga Natar Keluhkan Jalan Rusak Parah", "jalan rusak"),
    )
    .await;

    let config = test_config();
    let storage = test_storage();
    let own_site_only = insert_source(
        &storage,
        "Kabar Kemiling",
        &base,
        CrawlType::Html,
        SourceConfig {
            index_url: Some(format!("{}/", base)),
            ..SourceConfig::default()
        },
    );
    let with_partner = insert_source(
        &storage,
        "Kabar Kemiling Plus",
        &base,
        CrawlType::Html,
        SourceConfig {
            index_url: Some(format!("{}/", base)),
            allowed_domains: vec!["localhost".to_string()],
            ..SourceConfig::default()
        },
    );
    let engine = engine(&config, &storage);

    let articles = engine.crawl_source(&own_site_only).await.unwrap();
    let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/berita/2025/03/banjir-rendam-kemiling", base)]);

    let articles = engine.crawl_source(&with_partner).await.unwrap();
    let mut urls: Vec<String> = articles.into_iter().map(|a| a.url).collect();
    urls.sort_unstable();
    assert_eq!(
        urls,
        vec![
            format!("{}/berita/2025/03/banjir-rendam-kemiling", base),
            format!("{}/berita/2025/03/jalan-rusak-natar", partner),
        ]
    );
}

#[tokio::test]
async fn test_known_dead_link_is_not_fetched_again() {
    let server = MockServer::start().await;
    let base = server.uri();
    let feed = rss_feed(&base, &[("Sidang Lanjutan Kasus Korupsi Digelar", "/berita/sidang", "Singkat.")]);
    mount_page(&server, "/rss", feed).await;
    Mock::given(method("GET"))
        .and(path("/berita/sidang"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(
        &storage,
        "Kabar Lampung",
        &base,
        CrawlType::Rss,
        SourceConfig {
            rss_url: Some(format!("{}/rss", base)),
            ..SourceConfig::default()
        },
    );
    let engine = engine(&config, &storage);

    assert!(engine.crawl_source(&source).await.unwrap().is_empty());
    assert!(engine.crawl_source(&source).await.unwrap().is_empty());

    let status = LinkStatusStore::new(storage.clone())
        .status(&format!("{}/berita/sidang", base))
        .unwrap()
        .unwrap();
    assert_eq!(status.failure_reason.as_deref(), Some("HTTP 503 Error"));
}

#[tokio::test]
async fn test_auto_source_is_detected_and_persisted() {
    let server = MockServer::start().await;
    let base = server.uri();
    let feed = rss_feed(
        &base,
        &[("Festival Krakatau Kembali Digelar Tahun Ini", "/berita/festival", &article_body("festival"))],
    );
    mount_page(&server, "/rss", feed).await;

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(&storage, "Kabar Lampung", &base, CrawlType::Auto, SourceConfig::default());

    let articles = engine(&config, &storage).crawl_source(&source).await.unwrap();
    assert_eq!(articles.len(), 1);

    let stored = lock(&storage).unwrap().get_source(source.id).unwrap().unwrap();
    assert_eq!(stored.crawl_type, CrawlType::Rss);
    assert_eq!(stored.config.rss_url, Some(format!("{}/rss", base)));
}

#[tokio::test]
async fn test_missing_feed_is_a_source_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(
        &storage,
        "Kabar Lampung",
        &base,
        CrawlType::Rss,
        SourceConfig {
            rss_url: Some(format!("{}/rss", base)),
            ..SourceConfig::default()
        },
    );

    let err = engine(&config, &storage).crawl_source(&source).await.unwrap_err();
    assert!(err.to_string().contains("404"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_dedicated_section_strategy() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/kategori/news/lampung">Lampung</a><a href="/kategori/news/nasional">Nasional</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/kategori/news/lampung",
        r#"<a href="/news/1201/gubernur-tinjau-bendungan">Gubernur Tinjau Pembangunan Bendungan</a>
           <a href="/kategori/news/lampung?page=2">Berikutnya</a>
           <a href="/news/1202/x">Oke</a>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/kategori/news/nasional",
        r#"<a href="/news/1201/gubernur-tinjau-bendungan">Gubernur Tinjau Pembangunan Bendungan</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/news/1201/gubernur-tinjau-bendungan",
        article_page("Gubernur Tinjau Pembangunan Bendungan", "bendungan"),
    )
    .await;

    let mut registry = StrategyRegistry::new();
    registry.register(Arc::new(
        ListingOverride::lampung_pro()
            .with_index_url(format!("{}/", base))
            .with_allowed_domain("127.0.0.1"),
    ));
    registry.bind("Lampung Pro Lokal", "lampung-pro");

    let config = test_config();
    let storage = test_storage();
    let source = insert_source(&storage, "Lampung Pro Lokal", &base, CrawlType::Html, SourceConfig::default());

    let articles = engine(&config, &storage)
        .with_registry(registry)
        .crawl_source(&source)
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].url, format!("{}/news/1201/gubernur-tinjau-bendungan", base));
    assert_eq!(articles[0].title, "Gubernur Tinjau Pembangunan Bendungan");
}
