use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use news_harvester::url::extract_domain;
///
/// let url = Url::parse("https://News.Detik.com/berita").unwrap();
/// assert_eq!(extract_domain(&url), Some("news.detik.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips a leading `www.` from a host
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether two URLs live on the same site, ignoring a `www.` prefix
///
/// Ports are compared too so local mock servers on different ports stay distinct.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(ha), Some(hb)) => {
            strip_www(&ha) == strip_www(&hb) && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

/// Checks if a host matches a domain pattern
///
/// `"detik.com"` matches the bare domain and its `www.` form, `"*.detik.com"`
/// matches the bare domain and every subdomain.
///
/// ```
/// use news_harvester::url::domain_matches;
///
/// assert!(domain_matches("detik.com", "www.detik.com"));
/// assert!(!domain_matches("detik.com", "news.detik.com"));
/// assert!(domain_matches("*.detik.com", "news.detik.com"));
/// assert!(!domain_matches("*.detik.com", "notdetik.com"));
/// ```
pub fn domain_matches(pattern: &str, host: &str) -> bool {
    let host = host.to_lowercase();
    let pattern = pattern.to_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        strip_www(&host) == strip_www(&pattern)
    }
}

/// Checks if a URL's host falls under a registrable domain (itself or any subdomain)
pub fn host_within(url: &Url, domain: &str) -> bool {
    extract_domain(url)
        .map(|host| host == domain || host.ends_with(&format!(".{}", domain)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://lampungpro.co:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("lampungpro.co".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://WWW.SUARA.COM/lampung").unwrap();
        assert_eq!(extract_domain(&url), Some("www.suara.com".to_string()));
    }

    #[test]
    fn test_same_site_ignores_www() {
        let a = Url::parse("https://www.kompas.com/").unwrap();
        let b = Url::parse("https://kompas.com/read/2024/01/01/x").unwrap();
        assert!(same_site(&a, &b));

        let c = Url::parse("https://regional.kompas.com/").unwrap();
        assert!(!same_site(&a, &c));
    }

    #[test]
    fn test_same_site_respects_port() {
        let a = Url::parse("http://127.0.0.1:4000/").unwrap();
        let b = Url::parse("http://127.0.0.1:4001/").unwrap();
        assert!(!same_site(&a, &b));
    }

    #[test]
    fn test_domain_matches_exact_and_wildcard() {
        assert!(domain_matches("lampungpro.co", "lampungpro.co"));
        assert!(domain_matches("LampungPro.co", "www.lampungpro.co"));
        assert!(!domain_matches("lampungpro.co", "sub.lampungpro.co"));
        assert!(domain_matches("*.tribunnews.com", "lampung.tribunnews.com"));
        assert!(domain_matches("*.tribunnews.com", "tribunnews.com"));
        assert!(!domain_matches("*.tribunnews.com", "tribunnews.com.evil.net"));
    }

    #[test]
    fn test_host_within() {
        let url = Url::parse("https://lampung.suara.com/read/1").unwrap();
        assert!(host_within(&url, "suara.com"));
        assert!(!host_within(&url, "detik.com"));
    }
}
