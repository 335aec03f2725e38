//! Sitemap-driven crawling

use super::{CrawlContext, CrawlStrategy, Candidate};
use crate::crawler::{parse_sitemap, ArticleLinkClassifier, LinkCandidate};
use crate::storage::SourceRecord;
use crate::url::{base_origin, canonical_url, slug_title};
use async_trait::async_trait;
use std::collections::HashSet;
use url::Url;

/// Child sitemaps read from a sitemap index
const MAX_CHILD_SITEMAPS: usize = 3;

/// Crawls the pages listed in a source's sitemap
///
/// Titles come from URL slugs; the classifier's URL rules and ranking decide
/// which pages are fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapStrategy;

#[async_trait]
impl CrawlStrategy for SitemapStrategy {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    async fn discover(
        &self,
        ctx: &CrawlContext,
        source: &SourceRecord,
    ) -> crate::Result<Vec<Candidate>> {
        let site = Url::parse(&source.base_url)?;
        let sitemap_url = match source.config.sitemap_url.as_deref() {
            Some(url) => Url::parse(url)?,
            None => Url::parse(&format!("{}/sitemap.xml", base_origin(&site)))?,
        };

        let headers = &source.config.headers;
        let xml = ctx.fetch_index(sitemap_url.as_str(), headers).await?;
        let document = parse_sitemap(&xml, &sitemap_url);

        let mut pages = document.pages;
        for child in document.sitemaps.iter().take(MAX_CHILD_SITEMAPS) {
            match ctx.fetch_index(child, headers).await {
                Ok(xml) => match Url::parse(child) {
                    Ok(child_url) => pages.extend(parse_sitemap(&xml, &child_url).pages),
                    Err(e) => tracing::debug!("{}: bad child sitemap URL {}: {}", source.name, child, e),
                },
                Err(e) => {
                    tracing::warn!("{}: failed to read child sitemap {}: {}", source.name, child, e)
                }
            }
        }

        Ok(rank_pages(&ctx.classifier_for(source), &pages, &site))
    }
}

/// Filters sitemap URLs through the classifier's URL rules and ranks them
pub(super) fn rank_pages(
    classifier: &ArticleLinkClassifier,
    pages: &[String],
    site: &Url,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let links: Vec<LinkCandidate> = pages
        .iter()
        .filter_map(|page| {
            let url = Url::parse(page).ok()?;
            if !classifier.accepts_url(page, &url, site) {
                return None;
            }
            let url = canonical_url(&url);
            if !seen.insert(url.to_string()) {
                return None;
            }
            Some(LinkCandidate {
                title: slug_title(&url),
                url: url.to_string(),
            })
        })
        .collect();

    classifier
        .rank(links)
        .into_iter()
        .map(|link| Candidate::new(link.url, link.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_pages() {
        let site = Url::parse("https://lampungpro.co/").unwrap();
        let pages = vec![
            "https://lampungpro.co/about".to_string(),
            "https://lampungpro.co/news/12/banjir".to_string(),
            "https://lampungpro.co/news/2025/03/14/pemprov-lampung-umumkan-umr-baru".to_string(),
            "https://kompas.com/read/2025/03/14/lain".to_string(),
            "https://lampungpro.co/news/12/banjir".to_string(),
        ];
        let classifier = ArticleLinkClassifier::new().with_current_year(2025);

        let candidates = rank_pages(&classifier, &pages, &site);
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].url,
            "https://lampungpro.co/news/2025/03/14/pemprov-lampung-umumkan-umr-baru"
        );
        assert_eq!(candidates[0].title, "Pemprov Lampung Umumkan Umr Baru");
        assert_eq!(candidates[1].title, "Banjir");
    }
}
