use crate::UrlError;
use url::Url;

/// Query parameters dropped when canonicalising article URLs
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Resolves an `href` against the page it was found on
///
/// Returns `None` for empty hrefs, non-navigational schemes, or anything that is
/// not http(s) after resolution.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let url = base_url.join(href).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

/// Produces the stored form of an article URL: no fragment, no tracking parameters
pub fn canonical_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url
}

/// Parses a user-supplied site address, defaulting a bare host to `https://`
///
/// ```
/// use news_harvester::url::parse_site_url;
///
/// let url = parse_site_url("lampungpro.co").unwrap();
/// assert_eq!(url.as_str(), "https://lampungpro.co/");
/// ```
pub fn parse_site_url(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else if input.contains("://") {
        let scheme = input.split("://").next().unwrap_or_default();
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

/// Returns `scheme://host[:port]` for a URL
pub fn base_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Builds a readable title from the last path segment of a URL
///
/// `https://x.id/read/2024/01/02/123/banjir-rendam-bandar-lampung` becomes
/// `Banjir Rendam Bandar Lampung`.
pub fn slug_title(url: &Url) -> String {
    let slug = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    let slug = slug
        .trim_end_matches(".html")
        .trim_end_matches(".htm")
        .trim_end_matches(".php");

    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://lampungpro.co/kategori/news/").unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_link("/news/1-banjir", &base()).unwrap().as_str(),
            "https://lampungpro.co/news/1-banjir"
        );
        assert_eq!(
            resolve_link("berita-lain", &base()).unwrap().as_str(),
            "https://lampungpro.co/kategori/news/berita-lain"
        );
        assert_eq!(
            resolve_link("https://detik.com/a", &base()).unwrap().as_str(),
            "https://detik.com/a"
        );
    }

    #[test]
    fn test_resolve_rejects_non_http() {
        assert!(resolve_link("javascript:void(0)", &base()).is_none());
        assert!(resolve_link("mailto:redaksi@lampungpro.co", &base()).is_none());
        assert!(resolve_link("tel:0721", &base()).is_none());
        assert!(resolve_link("ftp://lampungpro.co/x", &base()).is_none());
        assert!(resolve_link("  ", &base()).is_none());
    }

    #[test]
    fn test_canonical_url_strips_fragment_and_tracking() {
        let url = Url::parse("https://kompas.com/read/1?utm_source=fb&page=2#comments").unwrap();
        assert_eq!(canonical_url(&url).as_str(), "https://kompas.com/read/1?page=2");

        let url = Url::parse("https://kompas.com/read/1?utm_medium=x").unwrap();
        assert_eq!(canonical_url(&url).as_str(), "https://kompas.com/read/1");
    }

    #[test]
    fn test_parse_site_url() {
        assert_eq!(
            parse_site_url("http://radarlampung.disway.id").unwrap().as_str(),
            "http://radarlampung.disway.id/"
        );
        assert!(matches!(
            parse_site_url("ftp://files.example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_base_origin() {
        let url = Url::parse("http://127.0.0.1:8080/a/b?c=d").unwrap();
        assert_eq!(base_origin(&url), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_slug_title() {
        let url = Url::parse("https://lampung.suara.com/read/2024/01/22/205115/banjir-rendam-bandar-lampung").unwrap();
        assert_eq!(slug_title(&url), "Banjir Rendam Bandar Lampung");

        let url = Url::parse("https://x.id/news/harga-cabai-naik.html/").unwrap();
        assert_eq!(slug_title(&url), "Harga Cabai Naik");
    }
}
