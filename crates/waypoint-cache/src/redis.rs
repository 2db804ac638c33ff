use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use waypoint_core::{CacheError, CacheValue, IndexCache};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Key prefix used by [`RedisIndexCache::new`].
pub const DEFAULT_KEY_PREFIX: &str = "wp:index:";

/// A Redis-based implementation of [`IndexCache`].
///
/// This implementation stores indexes as JSON strings in Redis, using a
/// configurable key prefix. Every value is written with `SET .. EX`, so a
/// replacement is a single atomic write and readers never observe a
/// partially published index.
#[derive(Debug, Clone)]
pub struct RedisIndexCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") {
        CacheError::Timeout(message)
    } else if lowered.contains("connection refused") || lowered.contains("broken pipe") {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisIndexCache {
    /// Creates a new Redis index cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis index cache with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Custom prefix for cache keys (e.g., "myapp:index:")
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Generates the Redis key for an index key.
    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl IndexCache for RedisIndexCache {
    async fn get<V: CacheValue>(&self, key: &str) -> Result<Option<Arc<V>>> {
        let redis_key = self.cache_key(key);
        trace!(key, "Fetching index from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(cached)) => {
                debug!(key, bytes = cached.len(), "Cache hit in Redis");
                match serde_json::from_str::<V>(&cached) {
                    Ok(value) => Ok(Some(Arc::new(value))),
                    Err(e) => {
                        warn!(key, error = %e, "Failed to deserialize cached index");
                        Err(CacheError::InvalidData(format!(
                            "invalid cached value for key '{redis_key}': {e}"
                        )))
                    }
                }
            }
            Ok(None) => {
                trace!(key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set<V: CacheValue>(&self, key: &str, value: Arc<V>, ttl: Duration) -> Result<()> {
        let redis_key = self.cache_key(key);
        trace!(key, ttl_secs = ttl.as_secs(), "Storing index in Redis cache");

        let json = match serde_json::to_string(value.as_ref()) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize index for caching");
                return Err(CacheError::Serialization(format!(
                    "failed to serialize cache value: {e}"
                )));
            }
        };

        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&redis_key, json, seconds).await {
            Ok(()) => {
                debug!(key, "Cached index in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to cache index in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        let redis_key = self.cache_key(key);
        trace!(key, "Removing index from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&redis_key).await {
            Ok(()) => {
                debug!(key, "Removed index from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to remove index from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
