//! Robots.txt directive scanning

use url::Url;

/// A fetched robots.txt file
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Values of every `Sitemap:` directive, in file order
    ///
    /// The directive name is matched case-insensitively; relative values are
    /// resolved against `base`, and anything that does not resolve is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use news_harvester::robots::ParsedRobots;
    /// use url::Url;
    ///
    /// let robots = ParsedRobots::from_content("User-agent: *\nSitemap: /sitemap_index.xml\n");
    /// let base = Url::parse("https://lampungpro.co/").unwrap();
    /// assert_eq!(
    ///     robots.sitemaps(&base),
    ///     vec!["https://lampungpro.co/sitemap_index.xml".to_string()]
    /// );
    /// ```
    pub fn sitemaps(&self, base: &Url) -> Vec<String> {
        self.content
            .lines()
            .filter_map(|line| {
                let line = line.split('#').next().unwrap_or_default().trim();
                let (name, value) = line.split_once(':')?;
                if !name.trim().eq_ignore_ascii_case("sitemap") {
                    return None;
                }
                base.join(value.trim()).ok().map(|u| u.to_string())
            })
            .collect()
    }
}
