//! State module for sources and article links
//!
//! # Components
//!
//! - `CrawlType` / `SourceConfig`: how a source is crawled and with which settings
//! - `SourceHealth`: the per-source active/inactive state machine
//! - `LinkState`: reachability of individual article URLs

mod crawl_type;
mod link_state;
mod source_health;

// Re-export main types
pub use crawl_type::{CrawlType, LinkFilters, SourceConfig};
pub use link_state::LinkState;
pub use source_health::{SourceHealth, FAILURE_THRESHOLD, NO_ARTICLES_REASON};
