// src/model.rs
//! Core data model shared by the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw entry handed over by a feed adapter. Lives for a single run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Opaque timestamp string as published by the feed.
    pub published_at: String,
    pub source_name: String,
    pub source_region_hint: String,
    /// Lead image URL, when the feed carries one.
    #[serde(default)]
    pub image: Option<String>,
}

/// Coarse domestic/global tag. The label set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "VN")]
    Vn,
    #[serde(rename = "GLOBAL")]
    Global,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Vn => "VN",
            Region::Global => "GLOBAL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic category. Oracle output outside the set maps to `Uncategorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI Tools")]
    AiTools,
    #[serde(rename = "Research")]
    Research,
    #[serde(rename = "Business")]
    Business,
    #[serde(rename = "Policy")]
    Policy,
    #[serde(rename = "Ethics")]
    Ethics,
    #[serde(rename = "Uncategorized")]
    Uncategorized,
}

impl Category {
    /// Labels the oracle is asked to choose from (fallback excluded).
    pub const ASSIGNABLE: [Category; 5] = [
        Category::AiTools,
        Category::Research,
        Category::Business,
        Category::Policy,
        Category::Ethics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::AiTools => "AI Tools",
            Category::Research => "Research",
            Category::Business => "Business",
            Category::Policy => "Policy",
            Category::Ethics => "Ethics",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Validate a free-form oracle answer against the closed label set.
    ///
    /// Tolerates surrounding quotes/markdown, trailing punctuation and a
    /// leading `Category:` prefix; anything else falls back to `Uncategorized`.
    pub fn from_response(raw: &str) -> Category {
        let mut s = raw.trim();
        if let Some(first_line) = s.lines().find(|l| !l.trim().is_empty()) {
            s = first_line.trim();
        }
        let lower = s.to_lowercase();
        let s = match lower.strip_prefix("category:") {
            Some(rest) => rest,
            None => lower.as_str(),
        };
        let s = s
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '.' | '!' | ','))
            .trim();

        Category::ASSIGNABLE
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .unwrap_or(Category::Uncategorized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cached enrichment for one content fingerprint. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    pub content_fingerprint: String,
    pub summary: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

/// Output item handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub country: Region,
    pub category: Category,
    pub hot_score: u32,
    pub source: String,
    pub link: String,
    pub published_at: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
