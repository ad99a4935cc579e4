// src/feed/types.rs
use crate::error::FetchError;
use crate::model::FeedEntry;
use crate::registry::FeedSource;

/// One poll of one feed. Not restartable mid-sequence.
#[async_trait::async_trait]
pub trait FeedSourceAdapter: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>, FetchError>;
    fn name(&self) -> &'static str;
}
