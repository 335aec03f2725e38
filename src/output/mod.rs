//! Operator-facing reports
//!
//! This module handles:
//! - Harvest statistics (articles, sources, link states)
//! - Source health tables

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::tracker::HealthReport;

/// Prints the health of every source as a table
pub fn print_health_report(report: &HealthReport) {
    println!("=== Source Health ===\n");
    println!(
        "Sources: {} total, {} active, {} inactive\n",
        report.total, report.active, report.inactive
    );

    println!(
        "{:>4}  {:<28} {:<8} {:>5}  {:<19}  {}",
        "ID", "Name", "Status", "Fails", "Last success", "Reason"
    );
    for source in &report.sources {
        let last_success = source
            .last_successful_crawl
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<28} {:<8} {:>5}  {:<19}  {}",
            source.id,
            truncate(&source.name, 28),
            source.status,
            source.consecutive_failures,
            last_success,
            source.failure_reason.as_deref().unwrap_or("")
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}
