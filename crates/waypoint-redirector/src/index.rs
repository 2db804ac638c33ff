//! Cached rule indexes.
//!
//! A [`CachedIndex`] is a read-optimised view of one rule table, built by an
//! [`IndexStrategy`] and published to an [`IndexCache`] under a key scoped by
//! rule type and index shape. Readers get an immutable `Arc` snapshot; writers
//! replace the snapshot wholesale through [`CachedIndex::rebuild`].

pub mod keyed;
pub mod ordered;

pub use keyed::{KeyedBy, KeyedIndex};
pub use ordered::{OrderedBy, OrderedIndex};

use crate::error::{RedirectorError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use waypoint_core::store::Result as StorageResult;
use waypoint_core::{CacheValue, IndexCache, ReadRuleStore, Rule, FOREVER};

/// How an index is loaded from the backing store and built from its records.
#[async_trait]
pub trait IndexStrategy: Send + Sync + 'static {
    type Rule: Rule;
    type Index: CacheValue;

    /// Name of the index shape, the second half of the cache key.
    fn shape(&self) -> &'static str;

    /// Reads every record the index is built from.
    async fn load<S: ReadRuleStore<Self::Rule>>(&self, store: &S) -> StorageResult<Vec<Self::Rule>>;

    /// Builds a complete index from the loaded records.
    fn build(&self, records: Vec<Self::Rule>) -> Self::Index;
}

/// An index over the records of `S`, published to `C`.
pub struct CachedIndex<St, S, C> {
    strategy: Arc<St>,
    store: Arc<S>,
    cache: Arc<C>,
    key: String,
    ttl: Duration,
}

impl<St, S, C> Clone for CachedIndex<St, S, C> {
    fn clone(&self) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            key: self.key.clone(),
            ttl: self.ttl,
        }
    }
}

impl<St, S, C> std::fmt::Debug for CachedIndex<St, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedIndex")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<St, S, C> CachedIndex<St, S, C>
where
    St: IndexStrategy,
    S: ReadRuleStore<St::Rule>,
    C: IndexCache,
{
    /// Creates an index published with the [`FOREVER`] TTL.
    pub fn new(strategy: St, store: Arc<S>, cache: Arc<C>) -> Self {
        let key = format!("{}:{}", <St::Rule as Rule>::KIND, strategy.shape());
        Self {
            strategy: Arc::new(strategy),
            store,
            cache,
            key,
            ttl: FOREVER,
        }
    }

    /// Overrides the TTL used when publishing the index.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Cache key the index is published under, e.g. `DomainRedirect:cached_by_domain`.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the published index, building and publishing it on a miss.
    ///
    /// A hit is returned as is. A cache that cannot be read is treated as a
    /// miss, so lookups keep working off the backing store.
    pub async fn get(&self) -> Result<Arc<St::Index>> {
        trace!(key = %self.key, "Looking up index");

        match self.cache.get::<St::Index>(&self.key).await {
            Ok(Some(index)) => {
                debug!(key = %self.key, "Index cache hit");
                return Ok(index);
            }
            Ok(None) => {
                debug!(key = %self.key, "Index cache miss, rebuilding");
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Index cache read failed, rebuilding from store"
                );
            }
        }

        self.rebuild().await
    }

    /// Loads every record, builds a complete index and publishes it.
    ///
    /// Publishing is best effort: if the cache rejects the write the freshly
    /// built index is still returned.
    pub async fn rebuild(&self) -> Result<Arc<St::Index>> {
        let records = self
            .strategy
            .load(self.store.as_ref())
            .await
            .map_err(|source| RedirectorError::Rebuild {
                kind: <St::Rule as Rule>::KIND,
                source,
            })?;

        let count = records.len();
        let index = Arc::new(self.strategy.build(records));
        debug!(key = %self.key, records = count, "Built index");

        match self.cache.set(&self.key, Arc::clone(&index), self.ttl).await {
            Ok(()) => info!(key = %self.key, records = count, "Published rebuilt index"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to publish rebuilt index"),
        }

        Ok(index)
    }
}
