//! AI News Pipeline: binary entrypoint.
//! Runs the pipeline once over the configured feed registry and exits.
//! Exit status is non-zero only when configuration or persistence fails.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_news_pipeline::config::oracle::OracleConfig;
use ai_news_pipeline::config::PipelineConfig;
use ai_news_pipeline::feed::RssFeedAdapter;
use ai_news_pipeline::oracle::build_oracle_from_config;
use ai_news_pipeline::registry::load_registry_default;
use ai_news_pipeline::store::JsonFileStore;
use ai_news_pipeline::Pipeline;

/// Compact logs by default; `NEWS_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_news_pipeline=info,warn"));

    let json = std::env::var("NEWS_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = PipelineConfig::load_default().context("loading pipeline config")?;
    let sources = load_registry_default().context("loading source registry")?;
    let oracle_cfg = OracleConfig::load_default().context("loading oracle config")?;
    let oracle = build_oracle_from_config(&oracle_cfg).context("building oracle")?;
    let adapter = RssFeedAdapter::new(cfg.limits.fetch_timeout()).context("building feed client")?;
    let store = JsonFileStore::new(
        cfg.paths.ledger.clone(),
        cfg.paths.cache.clone(),
        cfg.paths.output.clone(),
    );

    let oracle_name = oracle.provider_name();
    let pipeline = Pipeline::new(&cfg, sources, Arc::new(adapter), oracle, Arc::new(store));
    tracing::info!(
        sources = pipeline.sources().len(),
        oracle = oracle_name,
        "pipeline starting"
    );
    let report = pipeline.run_once().await.context("pipeline run")?;
    tracing::info!(
        emitted = report.emitted,
        persisted = report.persisted,
        "done"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
