// src/cache.rs
//! Enrichment cache: content fingerprint → {summary, category}.
//!
//! Append-only. `put` on an existing key is rejected and leaves the stored
//! record untouched, so a story pays for generation at most once.

use std::collections::BTreeMap;

use crate::fingerprint::ContentFingerprint;
use crate::model::EnrichmentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// A record already existed; nothing was written.
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentCache {
    records: BTreeMap<ContentFingerprint, EnrichmentRecord>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, fp: &str) -> Option<&EnrichmentRecord> {
        self.records.get(fp)
    }

    pub fn put(&mut self, fp: ContentFingerprint, record: EnrichmentRecord) -> PutOutcome {
        use std::collections::btree_map::Entry;
        match self.records.entry(fp) {
            Entry::Occupied(_) => PutOutcome::Rejected,
            Entry::Vacant(v) => {
                v.insert(record);
                PutOutcome::Inserted
            }
        }
    }

    /// JSON object keyed by fingerprint. BTreeMap keeps key order stable across rewrites.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        let records: BTreeMap<ContentFingerprint, EnrichmentRecord> = serde_json::from_str(s)?;
        Ok(Self { records })
    }
}
