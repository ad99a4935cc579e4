//! # Source Weights
//!
//! Configurable mapping from feed source names (e.g. "VnExpress", "OpenAI")
//! to the integer weight the hotness scorer adds on top of keyword hits.
//!
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings to canonical sources.
//! - Fallback order: aliases → exact match → default.
//! - `default_seed()` carries the built-in weights.
//!
//! Substring fallback is deliberately absent: a source's weight must only
//! change when its name (or alias) does.

use serde::Deserialize;
use std::collections::HashMap;

/// Configuration for source weights, loaded from the pipeline config or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceWeightsConfig {
    /// Weight for unlisted sources.
    #[serde(default = "default_default_weight")]
    pub default_weight: u32,
    /// Explicit weights for canonical source names.
    #[serde(default)]
    pub weights: HashMap<String, u32>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> u32 {
    1
}

impl Default for SourceWeightsConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourceWeightsConfig {
    /// Re-key weights and aliases by their normalized names so lookups are insensitive
    /// to the spelling used in config files.
    pub fn normalized(self) -> Self {
        Self {
            default_weight: self.default_weight,
            weights: self
                .weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            aliases: self
                .aliases
                .into_iter()
                .map(|(k, v)| (normalize(&k), normalize(&v)))
                .collect(),
        }
    }

    /// Override (or add) the weight of one source.
    pub fn set_weight(&mut self, source: &str, weight: u32) {
        self.weights.insert(normalize(source), weight);
    }

    /// Get the weight for a given source name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Default weight.
    pub fn weight_for(&self, source: &str) -> u32 {
        let s = normalize(source);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(&normalize(canon)) {
                return w;
            }
        }

        // 2) Exact weight match.
        if let Some(&w) = self.weights.get(&s) {
            return w;
        }

        // 3) Default.
        self.default_weight
    }

    /// Built-in seed used when the config carries no `[source_weights]` table.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("openai", 5),
            ("google ai", 4),
            ("vnexpress", 2),
            ("vietnamnet", 2),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("openai blog", "openai"),
            ("google ai blog", "google ai"),
            ("vn express", "vnexpress"),
            ("vietnamnet vn", "vietnamnet"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: 1,
            weights,
            aliases,
        }
    }
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    // Replace common separators with spaces.
    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    // Replace disruptive punctuation/whitespace with spaces.
    out = out.replace(['\n', '\r', '\t', '.', ',', '‚', '’', '\''], " ");

    // Collapse multiple spaces.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SourceWeightsConfig {
        SourceWeightsConfig::default_seed()
    }

    #[test]
    fn exact_match() {
        assert_eq!(cfg().weight_for("OpenAI"), 5);
        assert_eq!(cfg().weight_for("Google AI"), 4);
    }

    #[test]
    fn case_insensitive_lookup() {
        let c = cfg();
        assert_eq!(c.weight_for("VNEXPRESS"), 2);
        assert_eq!(c.weight_for("VnExpress"), 2);
        assert_eq!(c.weight_for("vnexpress"), 2);
    }

    #[test]
    fn alias_match() {
        let c = cfg();
        assert_eq!(c.weight_for("VN-Express"), 2);
        assert_eq!(c.weight_for("OpenAI Blog"), 5);
    }

    #[test]
    fn default_weight_used() {
        let c = cfg();
        assert_eq!(c.weight_for("Totally Unknown"), 1);
        assert_eq!(c.weight_for("The VnExpress Weekly"), 1);
    }

    #[test]
    fn normalized_rekeys_config_spelling() {
        let raw: SourceWeightsConfig = toml::from_str(
            r#"
default_weight = 3
[weights]
"Tuổi Trẻ" = 7
[aliases]
"tuoitre.vn" = "Tuổi Trẻ"
"#,
        )
        .unwrap();
        let c = raw.normalized();
        assert_eq!(c.weight_for("tuổi trẻ"), 7);
        assert_eq!(c.weight_for("TuoiTre.vn"), 7);
        assert_eq!(c.weight_for("elsewhere"), 3);
    }

    #[test]
    fn set_weight_overrides() {
        let mut c = cfg();
        c.set_weight("VnExpress", 9);
        assert_eq!(c.weight_for("vnexpress"), 9);
    }
}
