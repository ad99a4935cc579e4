// src/pipeline.rs
//! Pipeline orchestrator: one run from configured sources to a committed output batch.
//!
//! Stages:
//! 1) load ledger/cache/output from the state store (optionally prune the ledger)
//! 2) fetch all sources concurrently (bounded); a failing source is skipped
//! 3) reduce entries single-threaded, in source order: ledger gate, relevance,
//!    content fingerprint, cache lookup; distinct cache misses are queued once
//! 4) enrich queued fingerprints concurrently (bounded, with timeouts) and
//!    write successful records to the cache
//! 5) assemble news items, record their links, merge output, commit everything

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::PutOutcome;
use crate::config::{LimitsConfig, PipelineConfig};
use crate::error::{FetchError, OracleError, PersistenceError, RunError};
use crate::feed::FeedSourceAdapter;
use crate::fingerprint::{
    clean_text, content_fingerprint, link_fingerprint, short, ContentFingerprint, LinkFingerprint,
};
use crate::hotness::HotnessScorer;
use crate::model::{EnrichmentRecord, FeedEntry, NewsItem, Region};
use crate::oracle::{self, DynOracle, Enrichment};
use crate::region::RegionClassifier;
use crate::registry::FeedSource;
use crate::relevance::RelevanceFilter;
use crate::store::{PersistedState, StateStore};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_items_emitted_total", "News items emitted.");
        describe_counter!(
            "pipeline_entries_fetched_total",
            "Entries parsed from feed sources."
        );
        describe_counter!(
            "pipeline_entries_seen_total",
            "Entries skipped because their link was already emitted."
        );
        describe_counter!(
            "pipeline_entries_irrelevant_total",
            "Entries rejected by the relevance filter."
        );
        describe_counter!(
            "pipeline_cache_hits_total",
            "Entries enriched from the cache."
        );
        describe_counter!(
            "pipeline_oracle_calls_total",
            "Calls made to the enrichment oracle."
        );
        describe_counter!(
            "pipeline_oracle_errors_total",
            "Content fingerprints whose enrichment failed."
        );
        describe_counter!(
            "pipeline_source_errors_total",
            "Feed sources skipped after a fetch error."
        );
        describe_histogram!("pipeline_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a run."
        );
    });
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub emitted: usize,
    pub sources_fetched: usize,
    pub sources_skipped: usize,
    pub skipped_seen: usize,
    pub skipped_irrelevant: usize,
    /// Entries dropped because their enrichment failed.
    pub skipped_oracle: usize,
    pub cache_hits: usize,
    /// Distinct content fingerprints sent to the oracle.
    pub enrichments_requested: usize,
    pub ledger_pruned: usize,
    /// False when the run changed nothing and the store was left untouched.
    pub persisted: bool,
}

/// An entry that passed the ledger and relevance gates.
struct Candidate {
    entry: FeedEntry,
    title: String,
    link_fp: LinkFingerprint,
    content_fp: ContentFingerprint,
    region: Region,
    hot_score: u32,
}

/// A cache miss queued for enrichment; one per distinct content fingerprint.
struct PendingEnrichment {
    content_fp: ContentFingerprint,
    title: String,
    summary: String,
}

pub struct Pipeline {
    sources: Vec<FeedSource>,
    adapter: Arc<dyn FeedSourceAdapter>,
    oracle: DynOracle,
    store: Arc<dyn StateStore>,
    relevance: RelevanceFilter,
    region: RegionClassifier,
    hotness: HotnessScorer,
    limits: LimitsConfig,
}

impl Pipeline {
    /// Registry weight overrides are folded into the configured source weights.
    pub fn new(
        cfg: &PipelineConfig,
        sources: Vec<FeedSource>,
        adapter: Arc<dyn FeedSourceAdapter>,
        oracle: DynOracle,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let mut weights = cfg.source_weights.clone();
        for s in &sources {
            if let Some(w) = s.weight {
                weights.set_weight(&s.name, w);
            }
        }
        Self {
            relevance: RelevanceFilter::new(&cfg.keywords.relevance),
            region: RegionClassifier::new(&cfg.keywords.domestic_hints),
            hotness: HotnessScorer::new(&cfg.keywords.hot, weights),
            limits: cfg.limits.clone(),
            sources,
            adapter,
            oracle,
            store,
        }
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Execute one run. Only persistence failures are fatal; the store is
    /// written once, at the end, or not at all.
    pub async fn run_once(&self) -> Result<RunReport, RunError> {
        ensure_metrics_described();
        let now = Utc::now();
        let mut report = RunReport::default();

        // (1) Load state
        let mut state = self.store.load()?;
        if let Some(days) = self.limits.ledger_retention_days {
            report.ledger_pruned = state.ledger.prune_older_than(now, days);
            if report.ledger_pruned > 0 {
                tracing::info!(
                    target: "pipeline",
                    pruned = report.ledger_pruned,
                    days,
                    "ledger retention applied"
                );
            }
        }

        // (2) Fetch
        let fetched = self.fetch_all().await;

        // (3) Reduce
        let (candidates, pending) = self.reduce(fetched, &state, &mut report);

        // (4) Enrich cache misses
        report.enrichments_requested = pending.len();
        let mut cache_inserts = 0usize;
        for (content_fp, res) in self.enrich_all(pending).await {
            match res {
                Ok(Enrichment { summary, category }) => {
                    let record = EnrichmentRecord {
                        content_fingerprint: content_fp.clone(),
                        summary,
                        category,
                        created_at: now,
                    };
                    if state.cache.put(content_fp, record) == PutOutcome::Inserted {
                        cache_inserts += 1;
                    }
                }
                Err(e) => {
                    counter!("pipeline_oracle_errors_total").increment(1);
                    tracing::warn!(
                        target: "pipeline",
                        fp = short(&content_fp),
                        error = %e,
                        "enrichment failed, entry skipped"
                    );
                }
            }
        }

        // (5) Assemble
        let batch = self.assemble(candidates, &mut state, now, &mut report);
        report.emitted = batch.len();

        let changed = !batch.is_empty() || cache_inserts > 0 || report.ledger_pruned > 0;
        if changed {
            state.output = self.merge_output(&batch, std::mem::take(&mut state.output))?;
            self.store.commit(&state)?;
            report.persisted = true;
        } else {
            tracing::info!(target: "pipeline", "nothing new, state left untouched");
        }

        counter!("pipeline_items_emitted_total").increment(report.emitted as u64);
        gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);
        tracing::info!(
            target: "pipeline",
            emitted = report.emitted,
            sources_fetched = report.sources_fetched,
            sources_skipped = report.sources_skipped,
            skipped_seen = report.skipped_seen,
            skipped_irrelevant = report.skipped_irrelevant,
            skipped_oracle = report.skipped_oracle,
            cache_hits = report.cache_hits,
            enrichments = report.enrichments_requested,
            "run complete"
        );
        Ok(report)
    }

    /// Poll every source with bounded parallelism. Results come back in registry order.
    async fn fetch_all(&self) -> Vec<(FeedSource, Result<Vec<FeedEntry>, FetchError>)> {
        let sem = Arc::new(Semaphore::new(self.limits.fetch_concurrency.max(1)));
        let mut set = JoinSet::new();
        for (idx, source) in self.sources.iter().cloned().enumerate() {
            let adapter = Arc::clone(&self.adapter);
            let sem = Arc::clone(&sem);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let res = adapter.fetch(&source).await;
                (idx, res)
            });
        }

        let mut slots: Vec<Option<Result<Vec<FeedEntry>, FetchError>>> =
            (0..self.sources.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, res)) => slots[idx] = Some(res),
                Err(e) => tracing::warn!(target: "pipeline", error = %e, "fetch task failed"),
            }
        }

        self.sources
            .iter()
            .cloned()
            .zip(slots)
            .map(|(source, slot)| {
                let res = slot
                    .unwrap_or_else(|| Err(FetchError::Task("fetch task did not finish".to_string())));
                (source, res)
            })
            .collect()
    }

    /// Dedup/cache decisions. Runs on one task so two entries with the same
    /// content fingerprint can never both be queued for the oracle.
    fn reduce(
        &self,
        fetched: Vec<(FeedSource, Result<Vec<FeedEntry>, FetchError>)>,
        state: &PersistedState,
        report: &mut RunReport,
    ) -> (Vec<Candidate>, Vec<PendingEnrichment>) {
        let mut candidates = Vec::new();
        let mut pending = Vec::new();
        let mut queued: HashSet<ContentFingerprint> = HashSet::new();
        let mut claimed_links: HashSet<LinkFingerprint> = HashSet::new();

        for (source, res) in fetched {
            let entries = match res {
                Ok(v) => {
                    report.sources_fetched += 1;
                    v
                }
                Err(e) => {
                    report.sources_skipped += 1;
                    counter!("pipeline_source_errors_total").increment(1);
                    tracing::warn!(
                        target: "pipeline",
                        source = %source.name,
                        adapter = self.adapter.name(),
                        error = %e,
                        "source skipped"
                    );
                    continue;
                }
            };

            for entry in entries.into_iter().take(self.limits.max_items_per_source) {
                let link_fp = link_fingerprint(&entry.link);
                if state.ledger.contains(&link_fp) || claimed_links.contains(&link_fp) {
                    report.skipped_seen += 1;
                    counter!("pipeline_entries_seen_total").increment(1);
                    continue;
                }

                let title = clean_text(&entry.title);
                let summary = clean_text(&entry.summary);
                let text = format!("{title} {summary}");
                if !self.relevance.is_relevant(&text) {
                    report.skipped_irrelevant += 1;
                    counter!("pipeline_entries_irrelevant_total").increment(1);
                    continue;
                }

                let content_fp = content_fingerprint(&title, &summary);
                if state.cache.get(&content_fp).is_some() || queued.contains(&content_fp) {
                    report.cache_hits += 1;
                    counter!("pipeline_cache_hits_total").increment(1);
                } else {
                    queued.insert(content_fp.clone());
                    pending.push(PendingEnrichment {
                        content_fp: content_fp.clone(),
                        title: title.clone(),
                        summary: summary.clone(),
                    });
                }

                let region = self.region.classify(&entry.source_region_hint, &text);
                let hot_score = self.hotness.score(&text, &entry.source_name);
                tracing::debug!(
                    target: "pipeline",
                    source = %entry.source_name,
                    fp = short(&content_fp),
                    matched = ?self.relevance.matched(&text),
                    %region,
                    hot_score,
                    "candidate"
                );

                claimed_links.insert(link_fp.clone());
                candidates.push(Candidate {
                    entry,
                    title,
                    link_fp,
                    content_fp,
                    region,
                    hot_score,
                });
            }
        }
        (candidates, pending)
    }

    /// Oracle calls for distinct fingerprints, bounded by `oracle_concurrency`.
    async fn enrich_all(
        &self,
        pending: Vec<PendingEnrichment>,
    ) -> Vec<(ContentFingerprint, Result<Enrichment, OracleError>)> {
        let sem = Arc::new(Semaphore::new(self.limits.oracle_concurrency.max(1)));
        let timeout = self.limits.oracle_timeout();
        let mut set = JoinSet::new();
        for p in pending {
            let client = Arc::clone(&self.oracle);
            let sem = Arc::clone(&sem);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let res = oracle::enrich(client.as_ref(), &p.title, &p.summary, timeout).await;
                (p.content_fp, res)
            });
        }

        let mut out = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => out.push(pair),
                Err(e) => tracing::warn!(target: "pipeline", error = %e, "enrichment task failed"),
            }
        }
        out
    }

    /// Build output items for candidates whose enrichment resolved and record their links.
    fn assemble(
        &self,
        candidates: Vec<Candidate>,
        state: &mut PersistedState,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Vec<NewsItem> {
        let mut batch = Vec::with_capacity(candidates.len());
        for c in candidates {
            let Some(record) = state.cache.get(&c.content_fp) else {
                report.skipped_oracle += 1;
                continue;
            };
            let item = NewsItem {
                title: c.title,
                summary: record.summary.clone(),
                country: c.region,
                category: record.category,
                hot_score: c.hot_score,
                source: c.entry.source_name,
                link: c.entry.link,
                published_at: c.entry.published_at,
                generated_at: now,
                image: c.entry.image,
            };
            state.ledger.record(c.link_fp, now);
            batch.push(item);
        }
        batch
    }

    /// New items first, then prior items (minus any whose link was re-emitted),
    /// truncated to `max_output_items` when configured.
    fn merge_output(
        &self,
        batch: &[NewsItem],
        prior: Vec<serde_json::Value>,
    ) -> Result<Vec<serde_json::Value>, PersistenceError> {
        let new_links: HashSet<&str> = batch.iter().map(|i| i.link.as_str()).collect();
        let mut merged = batch
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        merged.extend(prior.into_iter().filter(|v| {
            v.get("link")
                .and_then(serde_json::Value::as_str)
                .map_or(true, |l| !new_links.contains(l))
        }));
        if let Some(max) = self.limits.max_output_items {
            merged.truncate(max);
        }
        Ok(merged)
    }
}
