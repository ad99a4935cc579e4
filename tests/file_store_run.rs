// tests/file_store_run.rs
mod common;

use std::fs;
use std::sync::Arc;

use ai_news_pipeline::config::PipelineConfig;
use ai_news_pipeline::store::JsonFileStore;
use ai_news_pipeline::{NewsItem, Pipeline, RunError};
use common::{entry, source, CountingOracle, FakeAdapter};
use tempfile::tempdir;

fn pipeline_in(dir: &std::path::Path, adapter: Arc<FakeAdapter>, oracle: Arc<CountingOracle>) -> Pipeline {
    let store = JsonFileStore::new(
        dir.join("cache/seen_links.json"),
        dir.join("cache/ai_cache.json"),
        dir.join("data/news.json"),
    );
    let src = source("VnExpress", "VN");
    Pipeline::new(
        &PipelineConfig::default(),
        vec![src],
        adapter,
        oracle,
        Arc::new(store),
    )
}

#[tokio::test]
async fn state_survives_a_restart_and_suppresses_reemission() {
    let dir = tempdir().unwrap();
    let src = source("VnExpress", "VN");
    let adapter = Arc::new(FakeAdapter::new());
    adapter.set_feed(
        &src,
        vec![entry(
            &src,
            "OpenAI ra mắt mô hình mới",
            "Mô hình mới.",
            "https://vnexpress.net/a",
        )],
    );
    let oracle = Arc::new(CountingOracle::new("AI Tools"));

    let first = pipeline_in(dir.path(), adapter.clone(), oracle.clone());
    assert_eq!(first.run_once().await.unwrap().emitted, 1);

    let raw = fs::read_to_string(dir.path().join("data/news.json")).unwrap();
    let items: Vec<NewsItem> = serde_json::from_str(&raw).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].hot_score, 6);
    assert_eq!(items[0].category.label(), "AI Tools");
    assert!(dir.path().join("cache/seen_links.json").exists());
    assert!(dir.path().join("cache/ai_cache.json").exists());
    assert!(!dir.path().join("data/news.json.tmp").exists());

    // fresh pipeline, same files
    let second = pipeline_in(dir.path(), adapter, oracle.clone());
    let report = second.run_once().await.unwrap();
    assert_eq!(report.emitted, 0);
    assert_eq!(report.skipped_seen, 1);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn corrupt_ledger_fails_the_run_before_any_fetch() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("cache")).unwrap();
    fs::write(dir.path().join("cache/seen_links.json"), "{not json").unwrap();

    let adapter = Arc::new(FakeAdapter::new());
    let oracle = Arc::new(CountingOracle::new("Research"));
    let p = pipeline_in(dir.path(), adapter.clone(), oracle);

    let err = p.run_once().await.unwrap_err();
    assert!(matches!(err, RunError::Persistence(_)));
    assert_eq!(adapter.fetches.load(std::sync::atomic::Ordering::SeqCst), 0);
}
