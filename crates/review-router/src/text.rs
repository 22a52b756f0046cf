//! Case-insensitive keyword matching on word boundaries.
//!
//! Plain substring tests misfire on short keywords ("hi" inside "shipping",
//! "count" inside "account"), so every keyword compiles to its own regex
//! anchored at word boundaries. Inner whitespace in multi-word keywords
//! matches any run of whitespace, and a trailing `*` turns a keyword into a
//! stem (`frustrat*` matches "frustration").

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// `\bkeyword\b`
    WholeWord,
    /// `\bkeyword`, so stems like "frustrat" match "frustrated".
    WordPrefix,
    /// Whole word plus a regular English suffix: "refund" matches
    /// "refunds" and "refunded" but not "refundable".
    Inflected,
}

#[derive(Debug, Clone)]
pub struct KeywordSet {
    keywords: Vec<(String, Regex)>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(keywords: &[S], mode: MatchMode) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .filter_map(|k| match compile(&k, mode) {
                Ok(re) => Some((k, re)),
                Err(e) => {
                    tracing::warn!(keyword = %k, error = %e, "Skipping keyword that does not compile");
                    None
                }
            })
            .collect();
        Self { keywords }
    }

    pub fn whole_words<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::new(keywords, MatchMode::WholeWord)
    }

    pub fn prefixes<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::new(keywords, MatchMode::WordPrefix)
    }

    pub fn inflected<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::new(keywords, MatchMode::Inflected)
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.keywords.iter().any(|(_, re)| re.is_match(text))
    }

    /// Number of distinct keywords present in `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        self.keywords.iter().filter(|(_, re)| re.is_match(text)).count()
    }

    /// First keyword (in declaration order) present in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

fn compile(keyword: &str, mode: MatchMode) -> Result<Regex, regex::Error> {
    let (keyword, mode) = match keyword.strip_suffix('*') {
        Some(stem) => (stem, MatchMode::WordPrefix),
        None => (keyword, mode),
    };
    let body = keyword
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let pattern = match mode {
        MatchMode::WholeWord => format!(r"(?i)\b{}\b", body),
        MatchMode::WordPrefix => format!(r"(?i)\b{}", body),
        MatchMode::Inflected => format!(r"(?i)\b{}(?:s|es|d|ed|ing)?\b", body),
    };
    Regex::new(&pattern)
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
