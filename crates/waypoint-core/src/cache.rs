use crate::error::CacheError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// TTL used for published indexes. Indexes are replaced on write rather
/// than expired, so this is effectively "forever".
pub const FOREVER: Duration = Duration::from_secs(365 * 86_400);

/// A value that can be published to an [`IndexCache`].
///
/// Serialization is required so that out-of-process caches (e.g. Redis) can
/// store the value; in-process caches keep the `Arc` as is.
pub trait CacheValue: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A key/value store holding published index snapshots.
///
/// A published value is never mutated in place; it is only ever replaced
/// wholesale by another `set` on the same key. No transactional guarantees
/// are expected across processes.
#[async_trait]
pub trait IndexCache: Send + Sync + 'static {
    /// Get a value from the cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache or has expired.
    async fn get<V: CacheValue>(&self, key: &str) -> Result<Option<Arc<V>>>;

    /// Store a value, replacing any previous value under `key`.
    async fn set<V: CacheValue>(&self, key: &str, value: Arc<V>, ttl: Duration) -> Result<()>;

    /// Remove a value. It is not an error if the key does not exist.
    async fn del(&self, key: &str) -> Result<()>;
}
