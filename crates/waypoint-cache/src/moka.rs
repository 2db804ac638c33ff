use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use waypoint_core::{CacheError, CacheValue, IndexCache};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

const DEFAULT_CAPACITY: u64 = 1_024;

/// A published value together with the TTL it was published with.
#[derive(Debug, Clone)]
struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Duration,
}

/// Expires each entry after the TTL given to its own `set`.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// An in-process index cache using Moka.
///
/// Values are kept as shared `Arc` snapshots, so a hit hands out the very
/// index that was published without copying or deserializing it. Each key
/// expires after the TTL given to the `set` that published it.
#[derive(Debug, Clone)]
pub struct MokaIndexCache {
    cache: Cache<String, Entry>,
}

impl MokaIndexCache {
    /// Creates a new Moka index cache with a default capacity of 1024 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a new Moka index cache with a custom maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries the cache can hold
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaIndexCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexCache for MokaIndexCache {
    async fn get<V: CacheValue>(&self, key: &str) -> Result<Option<Arc<V>>> {
        trace!(key, "Fetching index from Moka cache");

        let Some(entry) = self.cache.get(key).await else {
            trace!(key, "Cache miss in Moka");
            return Ok(None);
        };

        match entry.value.downcast::<V>() {
            Ok(value) => {
                debug!(key, "Cache hit in Moka");
                Ok(Some(value))
            }
            Err(_) => Err(CacheError::InvalidData(format!(
                "cached value for key '{key}' has an unexpected type"
            ))),
        }
    }

    async fn set<V: CacheValue>(&self, key: &str, value: Arc<V>, ttl: Duration) -> Result<()> {
        trace!(key, ttl_secs = ttl.as_secs(), "Storing index in Moka cache");

        let entry = Entry { value, ttl };
        self.cache.insert(key.to_string(), entry).await;
        debug!(key, "Cached index in Moka");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        trace!(key, "Removing index from Moka cache");

        self.cache.invalidate(key).await;
        debug!(key, "Removed index from Moka cache (if present)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        entries: HashMap<String, String>,
    }

    fn snapshot(pairs: &[(&str, &str)]) -> Arc<Snapshot> {
        Arc::new(Snapshot {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaIndexCache::new();
        let value = snapshot(&[("www.example.com", "example.com")]);

        // Initially empty
        assert!(cache.get::<Snapshot>("k").await.unwrap().is_none());

        cache.set("k", Arc::clone(&value), Duration::from_secs(60)).await.unwrap();

        let result = cache.get::<Snapshot>("k").await.unwrap().unwrap();
        assert_eq!(result, value);
    }

    #[tokio::test]
    async fn hit_returns_the_published_snapshot() {
        let cache = MokaIndexCache::new();
        let value = snapshot(&[("a", "b")]);

        cache.set("k", Arc::clone(&value), Duration::from_secs(60)).await.unwrap();

        let result = cache.get::<Snapshot>("k").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&result, &value));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let cache = MokaIndexCache::new();

        cache.set("k", snapshot(&[("a", "old")]), Duration::from_secs(60)).await.unwrap();
        cache.set("k", snapshot(&[("a", "new")]), Duration::from_secs(60)).await.unwrap();

        let result = cache.get::<Snapshot>("k").await.unwrap().unwrap();
        assert_eq!(result.entries["a"], "new");
    }

    #[tokio::test]
    async fn get_with_wrong_type_is_invalid_data() {
        let cache = MokaIndexCache::new();
        cache.set("k", snapshot(&[("a", "b")]), Duration::from_secs(60)).await.unwrap();

        let err = cache.get::<Vec<String>>("k").await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidData(_)));
    }

    #[tokio::test]
    async fn cache_del_removes_entry() {
        let cache = MokaIndexCache::new();
        cache.set("k", snapshot(&[("a", "b")]), Duration::from_secs(60)).await.unwrap();

        cache.del("k").await.unwrap();
        assert!(cache.get::<Snapshot>("k").await.unwrap().is_none());

        // Deleting a missing key is fine
        cache.del("k").await.unwrap();
    }

    #[tokio::test]
    async fn entry_expires_after_its_ttl() {
        let cache = MokaIndexCache::new();
        cache.set("short", snapshot(&[("a", "b")]), Duration::from_millis(50)).await.unwrap();
        cache.set("long", snapshot(&[("a", "b")]), Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get::<Snapshot>("short").await.unwrap().is_none());
        assert!(cache.get::<Snapshot>("long").await.unwrap().is_some());
    }
}
