//! RSS 2.0 and Atom feed parsing
//!
//! Only the fields the crawler needs are read: title, link, full content
//! (`content:encoded` / Atom `content`) and summary (`description` / `summary`).

use crate::HarvestError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One item of an RSS or Atom feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Content,
    Summary,
}

fn field_for(local_name: &[u8]) -> Option<Field> {
    match local_name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"encoded" | b"content" => Some(Field::Content),
        b"description" | b"summary" => Some(Field::Summary),
        _ => None,
    }
}

/// `href` of an Atom `<link>` when it is the entry's alternate link
fn atom_link_href(element: &BytesStart<'_>) -> Option<String> {
    let rel = element
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if matches!(rel.as_deref(), Some(r) if r != "alternate") {
        return None;
    }

    element
        .try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|href| !href.is_empty())
}

impl FeedEntry {
    fn assign(&mut self, field: Field, value: String) {
        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Content => &mut self.content,
            Field::Summary => &mut self.summary,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Parses a feed document into entries, in document order
///
/// Malformed XML after at least one complete entry is tolerated: the entries
/// read so far are returned.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, HarvestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"item" | b"entry" => {
                        current = Some(FeedEntry::default());
                        field = None;
                    }
                    name if current.is_some() && field.is_none() => {
                        field = field_for(name);
                        text.clear();
                        if field == Some(Field::Link) {
                            if let (Some(entry), Some(href)) = (current.as_mut(), atom_link_href(&e)) {
                                entry.assign(Field::Link, href);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" && field.is_none() {
                    if let (Some(entry), Some(href)) = (current.as_mut(), atom_link_href(&e)) {
                        entry.assign(Field::Link, href);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if field.is_some() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                        field = None;
                    }
                    name => {
                        if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                            if field_for(name) == Some(f) {
                                entry.assign(f, std::mem::take(&mut text));
                                field = None;
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if entries.is_empty() {
                    return Err(HarvestError::Feed(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                tracing::warn!("Feed truncated after {} entries: {}", entries.len(), e);
                break;
            }
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rss_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Kompas</title>
    <link>https://www.kompas.com</link>
    <item>
      <title>Banjir Rendam Kemiling</title>
      <link>https://regional.kompas.com/read/2025/01/02/banjir</link>
      <description><![CDATA[<p>Ringkasan <b>banjir</b>.</p>]]></description>
      <content:encoded><![CDATA[<p>Isi lengkap banjir.</p>]]></content:encoded>
    </item>
    <item>
      <title>Harga Cabai &amp; Bawang Naik</title>
      <link>https://regional.kompas.com/read/2025/01/03/cabai</link>
    </item>
  </channel>
</rss>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Banjir Rendam Kemiling"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://regional.kompas.com/read/2025/01/02/banjir")
        );
        assert_eq!(entries[0].summary.as_deref(), Some("<p>Ringkasan <b>banjir</b>.</p>"));
        assert_eq!(entries[0].content.as_deref(), Some("<p>Isi lengkap banjir.</p>"));
        assert_eq!(entries[1].title.as_deref(), Some("Harga Cabai & Bawang Naik"));
        assert_eq!(entries[1].content, None);
    }

    #[test]
    fn test_parse_atom_entries() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Lampung Pro</title>
  <link href="https://lampungpro.co/" rel="alternate"/>
  <entry>
    <title>Pemprov Lampung Umumkan UMP</title>
    <link rel="self" href="https://lampungpro.co/feed/entry/1"/>
    <link href="https://lampungpro.co/news/ump-lampung"/>
    <summary>Ringkasan UMP.</summary>
    <content type="html">&lt;p&gt;Isi UMP.&lt;/p&gt;</content>
  </entry>
</feed>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link.as_deref(), Some("https://lampungpro.co/news/ump-lampung"));
        assert_eq!(entries[0].summary.as_deref(), Some("Ringkasan UMP."));
        assert_eq!(entries[0].content.as_deref(), Some("<p>Isi UMP.</p>"));
    }

    #[test]
    fn test_truncated_feed_keeps_complete_entries() {
        let xml = r#"<rss><channel>
<item><title>Satu</title><link>https://a.id/1</link></item>
<item><title>Dua</title><link>https://a.id/2</lin"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Satu"));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_feed("<rss><channel><item><title>x</titl></item>").is_err());
    }
}
