// src/fingerprint.rs
//! Text cleaning and deterministic fingerprints (SHA-256, lowercase hex).
//!
//! Two keys share one digest: the link fingerprint feeds the seen-link ledger,
//! the content fingerprint feeds the enrichment cache.

use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Key of the seen-link ledger.
pub type LinkFingerprint = String;
/// Key of the enrichment cache.
pub type ContentFingerprint = String;

/// Decode entities, strip markup, unify quotes and collapse whitespace.
/// Case is preserved; this is the form shown in output items.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (replaced by a space so adjacent words stay apart)
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (includes NBSP from &nbsp;)
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Digest input form: cleaned and case-folded.
pub fn normalize(s: &str) -> String {
    clean_text(s).to_lowercase()
}

/// Raw digest of arbitrary bytes.
pub fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let out = hasher.finalize();
    let mut hex = String::with_capacity(out.len() * 2);
    for b in out.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    hex
}

pub fn link_fingerprint(link: &str) -> LinkFingerprint {
    digest(link.trim())
}

/// Entries with different links but the same normalized text share a key on purpose.
pub fn content_fingerprint(title: &str, summary: &str) -> ContentFingerprint {
    digest(&format!("{}\n{}", normalize(title), normalize(summary)))
}

/// Short form for log lines.
pub fn short(fp: &str) -> &str {
    fp.get(..12).unwrap_or(fp)
}
