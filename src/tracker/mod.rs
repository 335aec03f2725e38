//! Health tracking for sources and individual article links
//!
//! - `SourceHealthTracker`: applies crawl results to each source's health and
//!   deactivates sources after repeated failures
//! - `LinkStatusStore`: remembers dead article URLs so they are not refetched

mod health;
mod links;

pub use health::{HealthReport, HealthSnapshot, SourceHealthTracker};
pub use links::LinkStatusStore;
