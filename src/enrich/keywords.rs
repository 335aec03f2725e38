use crate::enrich::KeywordExtractor;
use std::collections::{HashMap, HashSet};

const STOPWORDS: &[&str] = &[
    // Indonesian
    "yang", "dan", "di", "ke", "dari", "ini", "itu", "dengan", "untuk", "pada", "adalah",
    "dalam", "tidak", "akan", "juga", "oleh", "sebagai", "bahwa", "atau", "ada", "karena",
    "telah", "sudah", "saat", "bisa", "dapat", "lebih", "para", "kata", "tersebut", "mereka",
    "kami", "kita", "saya", "anda", "ia", "dia", "hal", "agar", "namun", "serta", "hingga",
    "secara", "antara", "setelah", "sebelum", "masih", "belum", "harus", "menjadi", "yakni",
    "yaitu", "tahun", "hari", "baca", "jadi", "pun", "lagi", "sejak", "tak",
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "his", "how", "its", "may", "new", "now", "see", "who", "did",
    "get", "with", "this", "that", "from", "they", "will", "have", "been", "were", "said",
];

/// Frequency-based keyword extractor
///
/// Title tokens count three times. Tokens of two characters or fewer, digits-only
/// tokens and stopwords are ignored.
#[derive(Debug, Clone)]
pub struct FrequencyKeywords {
    max_keywords: usize,
    stopwords: HashSet<&'static str>,
}

impl FrequencyKeywords {
    pub fn new(max_keywords: usize) -> Self {
        Self {
            max_keywords,
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split(|c: char| !c.is_alphanumeric())
            .map(|t| t.to_lowercase())
            .filter(move |t| {
                t.chars().count() > 2
                    && !t.chars().all(|c| c.is_ascii_digit())
                    && !self.stopwords.contains(t.as_str())
            })
    }
}

impl Default for FrequencyKeywords {
    fn default() -> Self {
        Self::new(10)
    }
}

impl KeywordExtractor for FrequencyKeywords {
    fn extract(&self, title: &str, content: &str) -> String {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order = 0;

        let weighted = self
            .tokens(title)
            .map(|t| (t, 3))
            .chain(self.tokens(content).map(|t| (t, 1)));

        for (token, weight) in weighted {
            let entry = counts.entry(token).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += weight;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        // Highest count first, first occurrence breaks ties
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(token, _)| token)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_tokens_weighted() {
        let extractor = FrequencyKeywords::new(3);
        let keywords = extractor.extract(
            "Banjir Rendam Kemiling",
            "Warga mengungsi. Warga bertahan di masjid. Warga menunggu bantuan.",
        );
        assert_eq!(keywords, "banjir, rendam, kemiling");
    }

    #[test]
    fn test_stopwords_and_short_tokens_dropped() {
        let extractor = FrequencyKeywords::default();
        let keywords = extractor.extract("", "yang dan di ke 2024 ok pasar pasar tani");
        assert_eq!(keywords, "pasar, tani");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(FrequencyKeywords::default().extract("", ""), "");
    }
}
