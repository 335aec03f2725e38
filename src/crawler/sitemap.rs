//! Sitemap (`urlset` / `sitemapindex`) parsing

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

/// `<loc>` entries of a sitemap, split by document kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs from a `urlset`
    pub pages: Vec<String>,
    /// Child sitemap URLs from a `sitemapindex`
    pub sitemaps: Vec<String>,
}

/// Reads the `<loc>` of every `<url>` or `<sitemap>` entry, resolving relative
/// entries against `base`
///
/// Extension locations such as `<image:loc>` sit one level deeper and are ignored.
/// Parsing stops quietly at the first XML error; whatever was read is kept.
pub fn parse_sitemap(xml: &str, base: &Url) -> SitemapDocument {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_loc = false;
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut locs = Vec::new();
    let mut saw_urlset = false;
    let mut saw_index = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"urlset" => saw_urlset = true,
                    b"sitemapindex" => saw_index = true,
                    b"loc" => {
                        in_loc = matches!(
                            path.last().map(Vec::as_slice),
                            Some(b"url") | Some(b"sitemap")
                        )
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some(b"loc".as_slice()) {
                    in_loc = false;
                }
            }
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    let text = text.trim();
                    if let Ok(url) = base.join(text) {
                        locs.push(url.to_string());
                    }
                }
            }
            Ok(Event::CData(c)) if in_loc => {
                let text = String::from_utf8_lossy(&c);
                if let Ok(url) = base.join(text.trim()) {
                    locs.push(url.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Sitemap parse stopped: {}", e);
                break;
            }
            _ => {}
        }
    }

    if saw_index && !saw_urlset {
        SitemapDocument {
            pages: Vec::new(),
            sitemaps: locs,
        }
    } else {
        SitemapDocument {
            pages: locs,
            sitemaps: Vec::new(),
        }
    }
}
