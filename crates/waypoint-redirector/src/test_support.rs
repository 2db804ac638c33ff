//! Fakes that count calls and fail on demand.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use waypoint_cache::MokaIndexCache;
use waypoint_core::cache::Result as CacheResult;
use waypoint_core::store::Result as StorageResult;
use waypoint_core::{
    CacheError, CacheValue, IndexCache, OrderBy, ReadRuleStore, Rule, RuleId, RuleStore,
    StorageError,
};
use waypoint_storage::InMemoryRuleStore;

/// In-memory store counting full listings. Listings fail while `fail` is set.
#[derive(Debug)]
pub struct CountingStore<R> {
    inner: InMemoryRuleStore<R>,
    loads: AtomicUsize,
    fail: AtomicBool,
}

impl<R: Rule> CountingStore<R> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRuleStore::new(),
            loads: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record_load(&self) -> StorageResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store is down".to_string()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl<R: Rule> ReadRuleStore<R> for CountingStore<R> {
    async fn list_all(&self) -> StorageResult<Vec<R>> {
        self.record_load()?;
        self.inner.list_all().await
    }

    async fn list_all_ordered(&self, order: OrderBy) -> StorageResult<Vec<R>> {
        self.record_load()?;
        self.inner.list_all_ordered(order).await
    }

    async fn get(&self, id: RuleId) -> StorageResult<Option<R>> {
        self.inner.get(id).await
    }
}

#[async_trait]
impl<R: Rule> RuleStore<R> for CountingStore<R> {
    async fn upsert(&self, rule: R) -> StorageResult<R> {
        self.inner.upsert(rule).await
    }

    async fn delete(&self, id: RuleId) -> StorageResult<bool> {
        self.inner.delete(id).await
    }
}

/// Moka cache counting successful publishes, with switchable read and
/// write failures.
#[derive(Debug, Default)]
pub struct CountingCache {
    inner: MokaIndexCache,
    sets: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndexCache for CountingCache {
    async fn get<V: CacheValue>(&self, key: &str) -> CacheResult<Option<Arc<V>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("cache is down".to_string()));
        }
        self.inner.get::<V>(key).await
    }

    async fn set<V: CacheValue>(&self, key: &str, value: Arc<V>, ttl: Duration) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("cache is down".to_string()));
        }
        self.inner.set(key, value, ttl).await?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.inner.del(key).await
    }
}
