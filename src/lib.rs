// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod hotness;
pub mod ledger;
pub mod model;
pub mod oracle;
pub mod pipeline;
pub mod region;
pub mod registry;
pub mod relevance;
pub mod source_weights;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::error::{ConfigError, FetchError, OracleError, PersistenceError, RunError};
pub use crate::model::{Category, EnrichmentRecord, FeedEntry, NewsItem, Region};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::registry::FeedSource;
