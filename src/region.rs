// src/region.rs
//! Region classifier: domestic (VN) when the source is tagged domestic or the
//! text mentions a domestic place/brand, otherwise GLOBAL.

use crate::model::Region;

pub const DEFAULT_DOMESTIC_HINTS: &[&str] = &["việt nam", "tp hcm", "hà nội", "fpt", "vinai", "zalo"];

/// Source tags that count as domestic.
const DOMESTIC_TAGS: &[&str] = &["vn", "vietnam", "domestic"];

pub fn is_domestic_tag(tag: &str) -> bool {
    let t = tag.trim();
    DOMESTIC_TAGS.iter().any(|d| d.eq_ignore_ascii_case(t))
}

#[derive(Debug, Clone)]
pub struct RegionClassifier {
    hints: Vec<String>,
}

impl RegionClassifier {
    pub fn new<I, S>(hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hints = hints
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { hints }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_DOMESTIC_HINTS)
    }

    pub fn classify(&self, source_region_hint: &str, text: &str) -> Region {
        if is_domestic_tag(source_region_hint) {
            return Region::Vn;
        }
        let lower = text.to_lowercase();
        if self.hints.iter().any(|h| lower.contains(h.as_str())) {
            Region::Vn
        } else {
            Region::Global
        }
    }
}

impl Default for RegionClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domestic_tag_wins_without_text_hint() {
        let c = RegionClassifier::with_defaults();
        assert_eq!(c.classify("VN", "OpenAI ra mắt mô hình mới"), Region::Vn);
        assert_eq!(c.classify("vietnam", "nothing local"), Region::Vn);
    }

    #[test]
    fn text_hint_promotes_global_source() {
        let c = RegionClassifier::with_defaults();
        assert_eq!(
            c.classify("GLOBAL", "Startup from Hà Nội raises AI funding"),
            Region::Vn
        );
        assert_eq!(c.classify("global", "Zalo launches chatbot"), Region::Vn);
    }

    #[test]
    fn plain_global_stays_global() {
        let c = RegionClassifier::with_defaults();
        assert_eq!(c.classify("GLOBAL", "Google releases Gemini"), Region::Global);
        assert_eq!(c.classify("", ""), Region::Global);
    }
}
