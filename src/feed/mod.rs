// src/feed/mod.rs
//! Feed source adapters: turn one configured source into a finite list of entries.

pub mod rss;
pub mod types;

pub use rss::RssFeedAdapter;
pub use types::FeedSourceAdapter;
