//! Record cache consulted before and updated after detail lookups.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::config::Config;
use crate::models::{Author, Paper};

/// Key-value store for normalized records.
///
/// Keys are the identifiers callers look records up by, which may be aliases
/// (`arXiv:...`, `DOI:...`) of the canonical Semantic Scholar ID.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Cached paper, if any.
    async fn paper(&self, key: &str) -> Option<Paper>;

    /// Store a paper under `key`.
    async fn store_paper(&self, key: &str, paper: &Paper);

    /// Cached author, if any.
    async fn author(&self, key: &str) -> Option<Author>;

    /// Store an author under `key`.
    async fn store_author(&self, key: &str, author: &Author);
}

/// In-memory cache with TTL and bounded capacity.
#[derive(Clone)]
pub struct MemoryCache {
    papers: Cache<String, Paper>,
    authors: Cache<String, Author>,
}

fn bounded<V>(max_capacity: u64, ttl: Duration) -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(max_capacity)
        .time_to_live(ttl)
        .build()
}

impl MemoryCache {
    /// Cache holding up to `max_capacity` records of each kind for `ttl`.
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            papers: bounded(max_capacity, ttl),
            authors: bounded(max_capacity, ttl),
        }
    }

    /// Cache sized from `cache_max_size` and `cache_ttl`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_max_size, config.cache_ttl)
    }
}

#[async_trait]
impl RecordCache for MemoryCache {
    async fn paper(&self, key: &str) -> Option<Paper> {
        self.papers.get(key).await
    }

    async fn store_paper(&self, key: &str, paper: &Paper) {
        self.papers.insert(key.to_string(), paper.clone()).await;
    }

    async fn author(&self, key: &str) -> Option<Author> {
        self.authors.get(key).await
    }

    async fn store_author(&self, key: &str, author: &Author) {
        self.authors.insert(key.to_string(), author.clone()).await;
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("papers", &self.papers.entry_count())
            .field("authors", &self.authors.entry_count())
            .finish()
    }
}
