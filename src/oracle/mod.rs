//! Enrichment oracle: provider abstraction, call budget, and the two-call
//! enrichment (category + Vietnamese summary) used by the pipeline.

pub mod openai;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use crate::config::oracle::OracleConfig;
use crate::error::OracleError;
use crate::model::Category;

pub use openai::OpenAiOracle;

/// Max characters kept from a generated summary.
pub const SUMMARY_MAX_CHARS: usize = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Summarize,
    Categorize,
}

/// Text-in/text-out generation service.
#[async_trait::async_trait]
pub trait EnrichmentOracle: Send + Sync {
    async fn generate(&self, kind: InstructionKind, text: &str) -> Result<String, OracleError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynOracle = Arc<dyn EnrichmentOracle>;

/// Both enrichment fields, resolved together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub summary: String,
    pub category: Category,
}

/// Run the category and summary calls for one story, each under `timeout`.
/// Either both fields resolve or the whole enrichment fails.
pub async fn enrich(
    oracle: &dyn EnrichmentOracle,
    title: &str,
    summary: &str,
    timeout: Duration,
) -> Result<Enrichment, OracleError> {
    let text = format!("{title}\n{summary}");

    let raw_category = call_with_timeout(oracle, InstructionKind::Categorize, &text, timeout).await?;
    let category = Category::from_response(&raw_category);
    if category == Category::Uncategorized {
        tracing::debug!(
            target: "oracle",
            response = %truncate_chars(&raw_category, 40),
            "category outside label set"
        );
    }

    let raw_summary = call_with_timeout(oracle, InstructionKind::Summarize, &text, timeout).await?;
    let summary = sanitize_summary(&raw_summary);
    if summary.is_empty() {
        return Err(OracleError::Malformed("empty summary".to_string()));
    }

    Ok(Enrichment { summary, category })
}

async fn call_with_timeout(
    oracle: &dyn EnrichmentOracle,
    kind: InstructionKind,
    text: &str,
    timeout: Duration,
) -> Result<String, OracleError> {
    counter!("pipeline_oracle_calls_total").increment(1);
    match tokio::time::timeout(timeout, oracle.generate(kind, text)).await {
        Ok(res) => res,
        Err(_) => Err(OracleError::Timeout(timeout.as_secs())),
    }
}

/// Factory: build an oracle according to config and environment variables.
///
/// * If `ORACLE_TEST_MODE=mock`, returns a deterministic mock oracle.
/// * Else if `config.enabled == false`, returns a disabled oracle.
/// * Else builds the real provider wrapped with the per-run call budget.
pub fn build_oracle_from_config(config: &OracleConfig) -> Result<DynOracle, OracleError> {
    if std::env::var("ORACLE_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockOracle::default()));
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledOracle));
    }

    match config.provider.as_str() {
        "openai" => {
            let provider = OpenAiOracle::new(config.api_key.clone(), Some(&config.model))?;
            match config.max_calls_per_run {
                Some(max) => Ok(Arc::new(BudgetedOracle::new(provider, max))),
                None => Ok(Arc::new(provider)),
            }
        }
        other => {
            tracing::warn!(provider = other, "unsupported oracle provider, enrichment disabled");
            Ok(Arc::new(DisabledOracle))
        }
    }
}

/// Fails every call; used when enrichment is switched off.
pub struct DisabledOracle;

#[async_trait::async_trait]
impl EnrichmentOracle for DisabledOracle {
    async fn generate(&self, _kind: InstructionKind, _text: &str) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic oracle for local runs: fixed category, summary echoes the input.
#[derive(Debug, Clone)]
pub struct MockOracle {
    pub category: String,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self {
            category: Category::Research.label().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl EnrichmentOracle for MockOracle {
    async fn generate(&self, kind: InstructionKind, text: &str) -> Result<String, OracleError> {
        Ok(match kind {
            InstructionKind::Categorize => self.category.clone(),
            InstructionKind::Summarize => format!("Tóm tắt: {}", truncate_chars(text, 200)),
        })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Caps real calls per process; further calls fail with `Quota`.
pub struct BudgetedOracle<O: EnrichmentOracle> {
    inner: O,
    max_calls: u32,
    used: AtomicU32,
}

impl<O: EnrichmentOracle> BudgetedOracle<O> {
    pub fn new(inner: O, max_calls: u32) -> Self {
        Self {
            inner,
            max_calls,
            used: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl<O: EnrichmentOracle> EnrichmentOracle for BudgetedOracle<O> {
    async fn generate(&self, kind: InstructionKind, text: &str) -> Result<String, OracleError> {
        let claimed = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_calls).then_some(n + 1)
            })
            .is_ok();
        if !claimed {
            return Err(OracleError::Quota(format!(
                "{} calls per run",
                self.max_calls
            )));
        }
        self.inner.generate(kind, text).await
    }
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

/// Single paragraph, collapsed whitespace, capped length. Unicode is kept.
pub fn sanitize_summary(input: &str) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, SUMMARY_MAX_CHARS).trim().to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
