// src/config/mod.rs
//! Pipeline configuration (`config/pipeline.toml`).
//!
//! Every field has a default, so a missing default file is not an error.
//! An explicit `$PIPELINE_CONFIG_PATH` that does not exist is.

pub mod oracle;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::hotness::DEFAULT_HOT_KEYWORDS;
use crate::region::DEFAULT_DOMESTIC_HINTS;
use crate::relevance::DEFAULT_RELEVANCE_KEYWORDS;
use crate::source_weights::SourceWeightsConfig;

pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default)]
    pub source_weights: SourceWeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_ledger_path")]
    pub ledger: PathBuf,
    #[serde(default = "default_cache_path")]
    pub cache: PathBuf,
    #[serde(default = "default_output_path")]
    pub output: PathBuf,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("cache/seen_links.json")
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("cache/ai_cache.json")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("data/news.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ledger: default_ledger_path(),
            cache: default_cache_path(),
            output: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Raw entries considered per source per run.
    #[serde(default = "default_max_items_per_source")]
    pub max_items_per_source: usize,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_oracle_concurrency")]
    pub oracle_concurrency: usize,
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Oldest output items beyond this count are dropped. Unlimited when absent.
    #[serde(default)]
    pub max_output_items: Option<usize>,
    /// Seen-link retention. Unbounded growth when absent.
    #[serde(default)]
    pub ledger_retention_days: Option<u32>,
}

fn default_max_items_per_source() -> usize {
    8
}
fn default_fetch_concurrency() -> usize {
    4
}
fn default_oracle_concurrency() -> usize {
    2
}
fn default_oracle_timeout_secs() -> u64 {
    30
}
fn default_fetch_timeout_secs() -> u64 {
    15
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_items_per_source: default_max_items_per_source(),
            fetch_concurrency: default_fetch_concurrency(),
            oracle_concurrency: default_oracle_concurrency(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_output_items: None,
            ledger_retention_days: None,
        }
    }
}

impl LimitsConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default = "default_relevance")]
    pub relevance: Vec<String>,
    #[serde(default = "default_domestic_hints")]
    pub domestic_hints: Vec<String>,
    #[serde(default = "default_hot")]
    pub hot: Vec<String>,
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
fn default_relevance() -> Vec<String> {
    to_owned_list(DEFAULT_RELEVANCE_KEYWORDS)
}
fn default_domestic_hints() -> Vec<String> {
    to_owned_list(DEFAULT_DOMESTIC_HINTS)
}
fn default_hot() -> Vec<String> {
    to_owned_list(DEFAULT_HOT_KEYWORDS)
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            relevance: default_relevance(),
            domestic_hints: default_domestic_hints(),
            hot: default_hot(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut cfg: PipelineConfig = toml::from_str(s).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.source_weights = cfg.source_weights.normalized();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s, path)
    }

    /// $PIPELINE_CONFIG_PATH, else config/pipeline.toml, else built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_PIPELINE_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingEnvPath {
                    var: ENV_PIPELINE_CONFIG_PATH,
                    path: pb,
                });
            }
            return Self::load_from_file(&pb);
        }
        let pb = PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH);
        if pb.exists() {
            return Self::load_from_file(&pb);
        }
        tracing::info!("no pipeline config found, using built-in defaults");
        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        if l.max_items_per_source == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_items_per_source must be > 0".to_string(),
            ));
        }
        if l.fetch_concurrency == 0 || l.oracle_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "limits.*_concurrency must be > 0".to_string(),
            ));
        }
        if self.keywords.relevance.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "keywords.relevance must contain at least one keyword".to_string(),
            ));
        }
        Ok(())
    }
}
