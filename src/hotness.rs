// src/hotness.rs
//! Hotness score: 2 points per hot-keyword occurrence plus the source weight.
//!
//! The score is a relative ranking signal with no upper bound.

use crate::source_weights::SourceWeightsConfig;

pub const DEFAULT_HOT_KEYWORDS: &[&str] = &[
    "openai",
    "google",
    "meta",
    "gpt",
    "chatgpt",
    "ra mắt",
    "launch",
    "lừa",
    "sai sự thật",
    "mặt trái",
];

/// Points per keyword occurrence.
pub const POINTS_PER_HIT: u32 = 2;

#[derive(Debug, Clone)]
pub struct HotnessScorer {
    keywords: Vec<String>,
    weights: SourceWeightsConfig,
}

impl HotnessScorer {
    pub fn new<I, S>(keywords: I, weights: SourceWeightsConfig) -> Self
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
        Self {
            keywords: kws,
            weights,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_HOT_KEYWORDS, SourceWeightsConfig::default_seed())
    }

    /// Non-overlapping occurrences of all hot keywords in `text`.
    pub fn keyword_hits(&self, text: &str) -> u32 {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count() as u32)
            .sum()
    }

    pub fn source_weight(&self, source_name: &str) -> u32 {
        self.weights.weight_for(source_name)
    }

    pub fn score(&self, text: &str, source_name: &str) -> u32 {
        self.keyword_hits(text)
            .saturating_mul(POINTS_PER_HIT)
            .saturating_add(self.source_weight(source_name))
    }
}

impl Default for HotnessScorer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_openai_launch_on_vnexpress() {
        let s = HotnessScorer::with_defaults();
        // "openai" + "ra mắt" → 2 hits × 2, plus VnExpress weight 2
        assert_eq!(s.score("OpenAI ra mắt mô hình mới", "VnExpress"), 6);
    }

    #[test]
    fn repeated_keyword_counts_each_time() {
        let s = HotnessScorer::new(["launch"], SourceWeightsConfig::default_seed());
        assert_eq!(s.score("launch after launch after LAUNCH", "Unknown"), 3 * 2 + 1);
    }

    #[test]
    fn overlapping_keywords_each_count() {
        // "chatgpt" contains "gpt": both keywords hit.
        let s = HotnessScorer::new(["gpt", "chatgpt"], SourceWeightsConfig::default_seed());
        assert_eq!(s.keyword_hits("ChatGPT"), 2);
    }

    #[test]
    fn adding_an_occurrence_never_decreases() {
        let s = HotnessScorer::with_defaults();
        let base = "Meta ships a model";
        let more = format!("{base} and a launch event");
        assert!(s.score(&more, "X") >= s.score(base, "X"));
        assert_eq!(s.score(&more, "X"), s.score(base, "X") + 2);
    }

    #[test]
    fn changing_source_shifts_by_weight_difference() {
        let s = HotnessScorer::with_defaults();
        let text = "Google and OpenAI launch new GPT tools";
        let a = s.score(text, "OpenAI") as i64;
        let b = s.score(text, "Tuổi Trẻ") as i64;
        assert_eq!(a - b, 5 - 1);
    }

    #[test]
    fn no_keywords_yields_source_weight() {
        let s = HotnessScorer::with_defaults();
        assert_eq!(s.score("Quiet news day", "Google AI"), 4);
    }
}
