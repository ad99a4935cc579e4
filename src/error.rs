// src/error.rs
//! Error taxonomy for one pipeline run.
//!
//! `FetchError` and `OracleError` are recoverable and turn into skip decisions
//! inside the orchestrator. `PersistenceError` and `ConfigError` are fatal and
//! surface as `RunError` from `Pipeline::run_once`.

use std::path::PathBuf;

/// Feed retrieval / parse failure for a single source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http status {0}")]
    Status(u16),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Enrichment oracle failure for a single entry.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle call timed out after {0}s")]
    Timeout(u64),

    #[error("oracle quota exhausted: {0}")]
    Quota(String),

    #[error("oracle http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed oracle response: {0}")]
    Malformed(String),

    #[error("oracle is disabled")]
    Disabled,
}

/// Reading or writing persisted ledger/cache/output state.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("parsing JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{var} points to non-existent path {path}")]
    MissingEnvPath { var: &'static str, path: PathBuf },

    #[error("no source registry found (tried {0})")]
    NoRegistry(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal outcome of a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
