//! Article link classification and ranking
//!
//! Given an index page, finds the anchors that most likely point at news articles:
//! page chrome is stripped, every anchor is run through URL and text rules, and the
//! survivors are ranked by how article-like they look.

use crate::crawler::html::{element_text, remove_selected, remove_where};
use crate::url::{canonical_url, domain_matches, extract_domain, resolve_link, same_site};
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Minimum title length (exclusive) for a link to count as an article
const MIN_TITLE_CHARS: usize = 10;

/// Substrings that disqualify a link outright
const SKIP_PATTERNS: &[&str] = &[
    "javascript:", "#", "mailto:", "tel:", "/search", "/tag/", "/category/", "/archive/",
    "/page/", "/wp-admin", "/admin", "/login", "/register", "/cart", "/checkout", "/help",
    "/about", "/contact", "/privacy", "/terms", "/rss", "/feed", "/sitemap", "/galleries",
    "/videos", "/photo", "/picture", "/image", "/?", "&utm_", ".pdf", ".doc", ".xls", "#!",
    "/share", "/comment", "/discussion", "/forum", "/user/", "/profile", "/notification",
    "/preference", "/setting", "/subscribe", "/gallery", "/galeri", "/video", "/foto",
];

/// Non-article page keywords (Indonesian and English)
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "tentang kami", "about us", "about", "kontak kami", "contact us", "kebijakan privasi",
    "privacy policy", "syarat dan ketentuan", "terms", "sitemap", "bantuan", "help", "faq",
    "frequently asked", "redaksi", "editorial", "advertise", "iklan", "advertising",
    "berlangganan", "subscribe", "newsletter", "login", "sign up", "register", "registrasi",
    "profile", "profil", "setting", "lupa password", "forgot password", "hubungi admin",
    "hubungi kami", "beranda", "home page", "homepage", "halaman utama", "main page",
    "kategori", "category", "tag", "tags", "archive", "arsip", "powered by", "copyright",
    "hak cipta", "designed by", "404", "error", "not found", "page not found", "video",
    "videos", "foto", "photos", "gallery", "galeri", "facebook", "twitter", "instagram",
    "youtube", "tiktok", "instagram.com", "facebook.com", "twitter.com", "youtube.com",
    "whatsapp", "telegram", "linktr.ee", "bit.ly", "live streaming", "livestream", "lihat",
];

/// Social and link-shortener domains
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com", "twitter.com", "instagram.com", "youtube.com", "tiktok.com",
    "linkedin.com", "whatsapp.com", "telegram.org", "t.me", "youtu.be", "bit.ly",
    "tinyurl.com", "linktr.ee", "pinterest.com", "snapchat.com", "reddit.com", "weibo.com",
    "viber.com", "line.me", "kakao.com", "wa.me", "x.com",
];

/// URL fragments typical of article paths
const ARTICLE_PATTERNS: &[&str] = &[
    "/artikel/", "/article/", "/news/", "/post/", "/read/", "/story/", "/berita/", "/blog/",
    "/content/", "/entry/", "-news", "-article", "/news-", "/artikel-", "/berita-",
];

/// Anchor texts that belong to navigation rather than headlines
const NAVIGATION_TEXT: &[&str] = &[
    "read more", "read next", "continue reading", "lihat selengkapnya", "baca selengkapnya",
    "back to", "previous", "next", "home", "menu", "search", "sign in", "sign up", "login",
    "register", "subscribe", "follow", "share", "print", "email", "comment", "like",
    "download", "posted", "published", "category", "tag", "author",
];

/// Elements that are never part of the article listing
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

static NOISE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(sidebar|footer|header|nav|menu|breadcrumb|comment|related|advertisement|ads|social|widget|slide|banner|popover|modal|pagination|pager|next-|prev-|share-|follow-|subscribe-)",
    )
    .expect("noise class regex")
});

static NOISE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(sidebar|footer|header|nav|menu|ads|comment|related|social)")
        .expect("noise id regex")
});

static ARTICLE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(19|20)\d{2}/|/\d{4,}(-\d{2})?(-\d{2})?|-\d{2,}[a-z-]*$|\d{4}/\d{2}/\d{2}")
        .expect("article shape regex")
});

static DATE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(20\d{2})/(\d{2})(/\d{2})?").expect("date path regex")
});

/// A link believed to point at an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: String,
    pub title: String,
}

/// Finds and ranks article links on index pages
#[derive(Debug, Clone)]
pub struct ArticleLinkClassifier {
    allowed_domains: Vec<String>,
    current_year: i32,
}

impl Default for ArticleLinkClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleLinkClassifier {
    pub fn new() -> Self {
        Self {
            allowed_domains: Vec::new(),
            current_year: Utc::now().year(),
        }
    }

    /// Additional domain patterns links may point at besides the page's own site
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    /// Pins the year used to decide which dated URLs are recent
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Extracts ranked article candidates from an index page
    pub fn discover(&self, html: &str, page_url: &Url) -> Vec<LinkCandidate> {
        let mut document = Html::parse_document(html);
        strip_page_chrome(&mut document);

        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for anchor in document.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(resolved) = resolve_link(href, page_url) else {
                continue;
            };

            let title = anchor_title(anchor);
            if title.chars().count() <= MIN_TITLE_CHARS {
                tracing::debug!("Skipping {}: title too short", resolved);
                continue;
            }
            if is_navigation_text(&title) {
                tracing::debug!("Skipping {}: navigation text", resolved);
                continue;
            }
            if !self.accepts_url(href, &resolved, page_url) {
                continue;
            }

            let url = canonical_url(&resolved).to_string();
            if seen.insert(url.clone()) {
                candidates.push(LinkCandidate { url, title });
            }
        }

        self.rank(candidates)
    }

    /// Applies the URL rules: skip patterns, excluded keywords, social domains,
    /// article shape and same-site
    pub fn accepts_url(&self, href: &str, resolved: &Url, page_url: &Url) -> bool {
        let raw = href.to_lowercase();
        let full = resolved.as_str().to_lowercase();

        if SKIP_PATTERNS
            .iter()
            .any(|p| raw.contains(p) || full.contains(p))
        {
            return false;
        }

        if EXCLUDE_KEYWORDS.iter().any(|k| full.contains(k)) {
            return false;
        }

        if is_social_url(resolved) {
            return false;
        }

        if !looks_like_article(&full) {
            return false;
        }

        self.is_allowed_site(resolved, page_url)
    }

    fn is_allowed_site(&self, url: &Url, page_url: &Url) -> bool {
        if same_site(url, page_url) {
            return true;
        }
        match extract_domain(url) {
            Some(host) => self
                .allowed_domains
                .iter()
                .any(|pattern| domain_matches(pattern, &host)),
            None => false,
        }
    }

    /// Scores how article-like a candidate is; higher is better
    pub fn score(&self, candidate: &LinkCandidate) -> u32 {
        let mut score = 0;
        let url = candidate.url.to_lowercase();

        score += match candidate.title.chars().count() {
            n if n > 50 => 5,
            n if n > 30 => 4,
            n if n > 20 => 3,
            n if n > 10 => 1,
            _ => 0,
        };

        if let Some(caps) = DATE_PATH.captures(&url) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let recent = year >= self.current_year - 2;
            score += match (recent, caps.get(3).is_some()) {
                (true, true) => 4,
                (true, false) => 3,
                (false, _) => 2,
            };
        }

        if ["artikel/", "berita/", "news/", "post/"]
            .iter()
            .any(|k| url.contains(k))
        {
            score += 3;
        } else if ["article/", "story/", "read/", "content/"]
            .iter()
            .any(|k| url.contains(k))
        {
            score += 2;
        }

        let depth = url.split('/').count().saturating_sub(3);
        score += match depth {
            d if d >= 5 => 3,
            d if d >= 3 => 2,
            d if d >= 2 => 1,
            _ => 0,
        };

        let len = url.chars().count();
        if len > 50 && len < 200 {
            score += 2;
        }

        score
    }

    /// Sorts candidates by descending score; equal scores keep their page order
    pub fn rank(&self, candidates: Vec<LinkCandidate>) -> Vec<LinkCandidate> {
        let mut scored: Vec<(u32, LinkCandidate)> = candidates
            .into_iter()
            .map(|c| (self.score(&c), c))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

/// Removes navigation, footers, widgets and similar chrome from a page
pub fn strip_page_chrome(document: &mut Html) {
    remove_selected(document, CHROME_TAGS);
    remove_where(document, |el| {
        el.value().classes().any(|c| NOISE_CLASS.is_match(c))
            || el.value().id().map(|id| NOISE_ID.is_match(id)).unwrap_or(false)
    });
}

/// Anchor text, or the enclosing heading's text when the anchor text is too short
fn anchor_title(anchor: ElementRef<'_>) -> String {
    let text = element_text(anchor);
    if text.chars().count() >= MIN_TITLE_CHARS {
        return text;
    }

    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "h1" | "h2" | "h3" | "h4"))
        .map(element_text)
        .unwrap_or(text)
}

/// True for "read more"-style anchor texts and anything too short to be a headline
pub fn is_navigation_text(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.chars().count() < MIN_TITLE_CHARS {
        return true;
    }
    NAVIGATION_TEXT
        .iter()
        .any(|nav| text == *nav || text.starts_with(&format!("{} ", nav)))
}

/// True if the URL points at a social network or link shortener
pub fn is_social_url(url: &Url) -> bool {
    match extract_domain(url) {
        Some(host) => SOCIAL_DOMAINS
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
        None => false,
    }
}

fn looks_like_article(url: &str) -> bool {
    ARTICLE_PATTERNS.iter().any(|p| url.contains(p)) || ARTICLE_SHAPE.is_match(url)
}

/// Lighter URL check used when links come from a configured selector or a
/// dedicated domain strategy: no social links, no obvious non-article paths,
/// and the host must fall under `allowed_domain`
pub fn is_valid_article_url(url: &Url, allowed_domain: &str) -> bool {
    if is_social_url(url) {
        return false;
    }

    let lower = url.as_str().to_lowercase();
    let invalid = [
        "/tag/", "/category/", "/kategori/", "/search", "/login", "/register", "/about",
        "/contact", "/privacy", "/terms", "/rss", "/feed", "/sitemap", "/video", "/foto",
        "/galeri", "/gallery", "javascript:", "mailto:",
    ];
    if invalid.iter().any(|p| lower.contains(p)) {
        return false;
    }

    match extract_domain(url) {
        Some(host) => host == allowed_domain || host.ends_with(&format!(".{}", allowed_domain)),
        None => false,
    }
}
