//! URL handling module for News-Harvester
//!
//! Link resolution, canonical article URLs, domain extraction and domain pattern
//! matching used by the classifier, the strategies and the authenticity filter.

mod domain;
mod resolve;

pub use domain::{domain_matches, extract_domain, host_within, same_site, strip_www};
pub use resolve::{base_origin, canonical_url, parse_site_url, resolve_link, slug_title};
