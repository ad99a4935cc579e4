// src/relevance.rs
//! Relevance gate: case-insensitive substring match against a keyword list.
//!
//! No stemming and no negation handling. Short keywords such as "ai" will also
//! hit inside unrelated words ("said", "Thailand"); the keyword list is the
//! only lever against that.

/// Keywords covering English and Vietnamese AI vocabulary.
pub const DEFAULT_RELEVANCE_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "trí tuệ nhân tạo",
    "machine learning",
    "deep learning",
    "openai",
    "chatgpt",
    "chatbot",
    "llm",
    "genai",
];

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    /// Keywords are lower-cased and trimmed; empty ones are dropped so they cannot match everything.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kws: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        kws.sort();
        kws.dedup();
        Self { keywords: kws }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_RELEVANCE_KEYWORDS)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Keywords found in `text`, for diagnostics.
    pub fn matched(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
