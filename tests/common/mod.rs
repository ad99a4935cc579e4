// tests/common/mod.rs
// Shared fakes for pipeline integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_news_pipeline::config::PipelineConfig;
use ai_news_pipeline::feed::FeedSourceAdapter;
use ai_news_pipeline::oracle::{EnrichmentOracle, InstructionKind};
use ai_news_pipeline::store::MemoryStore;
use ai_news_pipeline::{FeedEntry, FeedSource, FetchError, OracleError, Pipeline};
use async_trait::async_trait;

pub fn source(name: &str, region: &str) -> FeedSource {
    FeedSource {
        name: name.to_string(),
        url: format!("https://feeds.test/{}", name.to_lowercase().replace(' ', "-")),
        region: region.to_string(),
        weight: None,
    }
}

pub fn entry(src: &FeedSource, title: &str, summary: &str, link: &str) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        summary: summary.to_string(),
        link: link.to_string(),
        published_at: "Mon, 01 Jan 2024 00:00:00 GMT".to_string(),
        source_name: src.name.clone(),
        source_region_hint: src.region.clone(),
        image: None,
    }
}

/// Serves canned entries keyed by source URL. Unknown URLs or URLs marked
/// failing return an error.
#[derive(Default)]
pub struct FakeAdapter {
    feeds: Mutex<HashMap<String, Vec<FeedEntry>>>,
    failing: Mutex<HashSet<String>>,
    pub fetches: AtomicUsize,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feed(&self, src: &FeedSource, entries: Vec<FeedEntry>) {
        self.feeds.lock().unwrap().insert(src.url.clone(), entries);
    }

    pub fn fail(&self, src: &FeedSource) {
        self.failing.lock().unwrap().insert(src.url.clone());
    }
}

#[async_trait]
impl FeedSourceAdapter for FakeAdapter {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&source.url) {
            return Err(FetchError::Status(503));
        }
        self.feeds
            .lock()
            .unwrap()
            .get(&source.url)
            .cloned()
            .ok_or_else(|| FetchError::Status(404))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Counts calls; fails any text containing one of the `fail_on` markers.
pub struct CountingOracle {
    pub calls: AtomicUsize,
    pub category: String,
    failing: Mutex<Vec<String>>,
}

impl CountingOracle {
    pub fn new(category: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            category: category.to_string(),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(&self, marker: &str) {
        self.failing.lock().unwrap().push(marker.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentOracle for CountingOracle {
    async fn generate(&self, kind: InstructionKind, text: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().iter().any(|m| text.contains(m.as_str())) {
            return Err(OracleError::Malformed("scripted failure".to_string()));
        }
        Ok(match kind {
            InstructionKind::Categorize => self.category.clone(),
            InstructionKind::Summarize => format!("Tóm tắt {} ký tự.", text.chars().count()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

pub struct Harness {
    pub adapter: Arc<FakeAdapter>,
    pub oracle: Arc<CountingOracle>,
    pub store: Arc<MemoryStore>,
    pub pipeline: Pipeline,
}

pub fn harness(sources: Vec<FeedSource>) -> Harness {
    harness_with(PipelineConfig::default(), sources, MemoryStore::new())
}

pub fn harness_with(cfg: PipelineConfig, sources: Vec<FeedSource>, store: MemoryStore) -> Harness {
    let adapter = Arc::new(FakeAdapter::new());
    let oracle = Arc::new(CountingOracle::new("Research"));
    let store = Arc::new(store);
    let pipeline = Pipeline::new(
        &cfg,
        sources,
        adapter.clone(),
        oracle.clone(),
        store.clone(),
    );
    Harness {
        adapter,
        oracle,
        store,
        pipeline,
    }
}
