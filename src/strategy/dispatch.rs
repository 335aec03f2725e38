//! Strategy selection for a source

use super::{
    harvest, CrawlContext, CrawlStrategy, HarvestedArticle, HtmlStrategy, RssStrategy,
    SitemapStrategy, StrategyRegistry,
};
use crate::config::Config;
use crate::crawler::CrawlTypeDetector;
use crate::state::CrawlType;
use crate::storage::{lock, SharedStorage, SourceRecord, SourceUpdate, Storage};
use reqwest::Client;
use std::borrow::Cow;

/// Crawls one source with the strategy it resolves to
///
/// A dedicated strategy bound to the source wins; otherwise the source's crawl
/// type picks the generic strategy, running detection first for `auto` sources.
pub struct CrawlEngine {
    ctx: CrawlContext,
    detector: CrawlTypeDetector,
    registry: StrategyRegistry,
    domain_overrides: bool,
    storage: SharedStorage,
    rss: RssStrategy,
    html: HtmlStrategy,
    sitemap: SitemapStrategy,
}

impl CrawlEngine {
    pub fn new(config: &Config, client: Client, storage: SharedStorage) -> Self {
        let ctx = CrawlContext::new(config, client.clone(), storage.clone());
        Self {
            detector: CrawlTypeDetector::new(client, ctx.timeouts),
            ctx,
            registry: StrategyRegistry::with_builtin(),
            domain_overrides: config.crawler.domain_overrides,
            storage,
            rss: RssStrategy::new(),
            html: HtmlStrategy,
            sitemap: SitemapStrategy,
        }
    }

    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn context(&self) -> &CrawlContext {
        &self.ctx
    }

    pub fn detector(&self) -> &CrawlTypeDetector {
        &self.detector
    }

    /// Crawls a source and returns its accepted articles
    pub async fn crawl_source(&self, source: &SourceRecord) -> crate::Result<Vec<HarvestedArticle>> {
        if self.domain_overrides {
            if let Some(strategy) = self.registry.resolve(source) {
                tracing::info!("Crawling {} with dedicated strategy '{}'", source.name, strategy.name());
                return harvest(strategy.as_ref(), &self.ctx, source).await;
            }
        }

        let source = self.resolve_auto(source).await;
        tracing::info!("Crawling {} ({})", source.name, source.crawl_type);

        let strategy: &dyn CrawlStrategy = match source.crawl_type {
            CrawlType::Rss => &self.rss,
            CrawlType::Sitemap => &self.sitemap,
            CrawlType::Html | CrawlType::Auto => &self.html,
        };
        harvest(strategy, &self.ctx, &source).await
    }

    /// Replaces `auto` with a detected crawl type and persists the result
    async fn resolve_auto<'a>(&self, source: &'a SourceRecord) -> Cow<'a, SourceRecord> {
        if source.crawl_type != CrawlType::Auto {
            return Cow::Borrowed(source);
        }

        let detection = self.detector.detect(&source.base_url).await;
        let mut resolved = source.clone();
        resolved.crawl_type = detection.crawl_type;
        resolved.config.merge(detection.config);

        let update = SourceUpdate {
            crawl_type: Some(resolved.crawl_type),
            config: Some(resolved.config.clone()),
            ..SourceUpdate::default()
        };
        match lock(&self.storage).and_then(|mut storage| storage.update_source(source.id, &update)) {
            Ok(_) => tracing::info!("Auto-detected {}: {}", source.name, resolved.crawl_type),
            Err(e) => tracing::warn!("Could not persist detected type for {}: {}", source.name, e),
        }

        Cow::Owned(resolved)
    }
}
