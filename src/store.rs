// src/store.rs
//! Persisted run state: seen-link ledger, enrichment cache and the output collection.
//!
//! Contract: load everything at run start, commit everything at run end.
//! A commit either writes all three documents or reports an error.
//!
//! Publish order is output, cache, ledger. If a rename fails part way, the
//! ledger is still the old one, so the affected links are retried next run
//! and the output merge drops the duplicate by link. Leftover `*.tmp` files
//! are removed on any failure.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cache::EnrichmentCache;
use crate::error::PersistenceError;
use crate::ledger::SeenLinkLedger;

/// Whole persisted state as seen by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub ledger: SeenLinkLedger,
    pub cache: EnrichmentCache,
    /// Output items owned by downstream consumers; kept verbatim.
    pub output: Vec<serde_json::Value>,
}

pub trait StateStore: Send + Sync {
    /// Missing documents load as empty (first run).
    fn load(&self) -> Result<PersistedState, PersistenceError>;
    fn commit(&self, state: &PersistedState) -> Result<(), PersistenceError>;
}

/// JSON documents at fixed paths.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    pub ledger_path: PathBuf,
    pub cache_path: PathBuf,
    pub output_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(
        ledger_path: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            cache_path: cache_path.into(),
            output_path: output_path.into(),
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState, PersistenceError> {
        let ledger = match read_optional(&self.ledger_path)? {
            Some(s) => SeenLinkLedger::from_json(&s).map_err(|e| corrupt(&self.ledger_path, e))?,
            None => SeenLinkLedger::default(),
        };
        let cache = match read_optional(&self.cache_path)? {
            Some(s) => EnrichmentCache::from_json(&s).map_err(|e| corrupt(&self.cache_path, e))?,
            None => EnrichmentCache::default(),
        };
        let output = match read_optional(&self.output_path)? {
            Some(s) => serde_json::from_str::<Vec<serde_json::Value>>(&s)
                .map_err(|e| corrupt(&self.output_path, e))?,
            None => Vec::new(),
        };
        tracing::debug!(
            target: "store",
            ledger = ledger.len(),
            cache = cache.len(),
            output = output.len(),
            "state loaded"
        );
        Ok(PersistedState {
            ledger,
            cache,
            output,
        })
    }

    fn commit(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        // Serialize everything before touching the filesystem.
        // Ledger last: a link must never be marked seen before its item is published.
        let docs = [
            (&self.output_path, serde_json::to_string_pretty(&state.output)?),
            (&self.cache_path, state.cache.to_json()?),
            (&self.ledger_path, state.ledger.to_json()?),
        ];

        // Stage: write every document to a sibling tmp file.
        let mut staged: Vec<(PathBuf, &PathBuf)> = Vec::with_capacity(docs.len());
        for (path, body) in docs.iter() {
            match write_tmp(path, body) {
                Ok(tmp) => staged.push((tmp, *path)),
                Err(e) => {
                    remove_staged(&staged);
                    return Err(e);
                }
            }
        }

        // Publish: rename into place, in order.
        for (idx, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, path) {
                remove_staged(&staged[idx..]);
                tracing::warn!(
                    target: "store",
                    path = %path.display(),
                    published = idx,
                    "commit aborted part way"
                );
                return Err(PersistenceError::io(path.as_path(), e));
            }
        }
        tracing::debug!(target: "store", "state committed");
        Ok(())
    }
}

fn remove_staged(staged: &[(PathBuf, &PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, PersistenceError> {
    match fs::read_to_string(path) {
        Ok(s) if s.trim().is_empty() => Ok(None),
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::io(path, e)),
    }
}

fn corrupt(path: &Path, source: serde_json::Error) -> PersistenceError {
    PersistenceError::Corrupt {
        path: path.to_path_buf(),
        source,
    }
}

fn write_tmp(path: &Path, body: &str) -> Result<PathBuf, PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut f = fs::File::create(&tmp).map_err(|e| PersistenceError::io(&tmp, e))?;
    f.write_all(body.as_bytes())
        .and_then(|_| f.sync_all())
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    Ok(tmp)
}

/// In-memory store for tests and dry runs. Can be told to fail commits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
    fail_commit: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> PersistedState {
        match self.state.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedState, PersistenceError> {
        Ok(self.snapshot())
    }

    fn commit(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store set to fail".to_string(),
            ));
        }
        let mut g = self
            .state
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store poisoned".to_string()))?;
        *g = state.clone();
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
