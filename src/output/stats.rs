//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! article, source and link statistics from the storage layer.

use crate::state::LinkState;
use crate::storage::{Storage, StorageResult};
use crate::sources::{last_crawl_status, LastCrawlStatus};
use std::collections::HashMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored articles
    pub total_articles: u64,

    /// Non-deleted sources, split by health
    pub active_sources: usize,
    pub inactive_sources: usize,

    /// Link status records by state
    pub links_by_state: HashMap<LinkState, u64>,

    /// Newest crawl and the articles stored with it
    pub last_crawl: Option<LastCrawlStatus>,
}

impl HarvestStatistics {
    /// Links that are skipped without a fetch
    pub fn dead_links(&self) -> u64 {
        self.links_by_state
            .iter()
            .filter(|(state, _)| !state.is_active())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<HarvestStatistics> {
    let sources = storage.list_sources()?;
    let active_sources = sources.iter().filter(|s| s.is_active()).count();

    Ok(HarvestStatistics {
        total_articles: storage.count_articles()?,
        active_sources,
        inactive_sources: sources.len() - active_sources,
        links_by_state: storage.count_links_by_state()?,
        last_crawl: last_crawl_status(storage)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Articles stored: {}", stats.total_articles);
    println!(
        "  Sources: {} active, {} inactive",
        stats.active_sources, stats.inactive_sources
    );
    match &stats.last_crawl {
        Some(last) => println!(
            "  Last crawl: {} ({} articles)",
            last.last_crawl_time.format("%Y-%m-%d %H:%M:%S UTC"),
            last.articles_in_last_crawl
        ),
        None => println!("  Last crawl: never"),
    }
    println!();

    if !stats.links_by_state.is_empty() {
        println!("Tracked Links by State:");
        let mut counts: Vec<_> = stats.links_by_state.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (state, count) in counts {
            println!("  {}: {}", state, count);
        }
        println!("  Skipped without fetch: {}", stats.dead_links());
    }
}
