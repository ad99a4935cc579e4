// src/ledger.rs
//! Seen-link ledger: the set of link fingerprints already emitted by past runs.
//!
//! Membership only grows during normal operation. The single exception is the
//! opt-in retention policy (`prune_older_than`), which drops timestamped
//! entries older than a configured age.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fingerprint::LinkFingerprint;

/// On-disk form of one ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LedgerEntryRepr {
    Full {
        fingerprint: LinkFingerprint,
        #[serde(rename = "recordedAt", default)]
        recorded_at: Option<DateTime<Utc>>,
    },
    // Older ledgers were a bare list of fingerprints.
    Bare(LinkFingerprint),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenLinkLedger {
    entries: HashMap<LinkFingerprint, Option<DateTime<Utc>>>,
}

impl SeenLinkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fp: &str) -> bool {
        self.entries.contains_key(fp)
    }

    /// Record a fingerprint. Re-recording keeps the original timestamp.
    /// Returns `true` if the fingerprint was new.
    pub fn record(&mut self, fp: LinkFingerprint, at: DateTime<Utc>) -> bool {
        use std::collections::hash_map::Entry;
        match self.entries.entry(fp) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Some(at));
                true
            }
        }
    }

    /// Retention: drop entries recorded more than `days` before `now`.
    /// Entries without a timestamp are kept. Returns the number removed.
    pub fn prune_older_than(&mut self, now: DateTime<Utc>, days: u32) -> usize {
        let horizon = now - Duration::days(i64::from(days));
        let before = self.entries.len();
        self.entries
            .retain(|_, at| at.map_or(true, |ts| ts >= horizon));
        before - self.entries.len()
    }

    /// Serialize as a JSON array, sorted by fingerprint so rewrites are stable.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut items: Vec<LedgerEntryRepr> = self
            .entries
            .iter()
            .map(|(fp, at)| LedgerEntryRepr::Full {
                fingerprint: fp.clone(),
                recorded_at: *at,
            })
            .collect();
        items.sort_by(|a, b| repr_key(a).cmp(repr_key(b)));
        serde_json::to_string_pretty(&items)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<LedgerEntryRepr> = serde_json::from_str(s)?;
        let mut entries = HashMap::with_capacity(items.len());
        for it in items {
            match it {
                LedgerEntryRepr::Full {
                    fingerprint,
                    recorded_at,
                } => {
                    entries.entry(fingerprint).or_insert(recorded_at);
                }
                LedgerEntryRepr::Bare(fp) => {
                    entries.entry(fp).or_insert(None);
                }
            }
        }
        Ok(Self { entries })
    }
}

fn repr_key(r: &LedgerEntryRepr) -> &str {
    match r {
        LedgerEntryRepr::Full { fingerprint, .. } => fingerprint,
        LedgerEntryRepr::Bare(fp) => fp,
    }
}
