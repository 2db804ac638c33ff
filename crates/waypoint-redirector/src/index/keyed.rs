use super::IndexStrategy;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use waypoint_core::store::Result as StorageResult;
use waypoint_core::{DomainRedirect, ReadRuleStore, Rule};

/// Exact-match index from lookup key to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedIndex<R> {
    built_at: Timestamp,
    entries: HashMap<String, R>,
}

impl<R> KeyedIndex<R> {
    pub fn get(&self, key: &str) -> Option<&R> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn built_at(&self) -> Timestamp {
        self.built_at
    }
}

/// Builds a [`KeyedIndex`] from a full scan, keying each record with `key`.
///
/// Records for which `key` returns `None` are left out. When two records
/// share a key the one with the higher id wins.
pub struct KeyedBy<R> {
    shape: &'static str,
    key: fn(&R) -> Option<String>,
}

impl<R> KeyedBy<R> {
    pub fn new(shape: &'static str, key: fn(&R) -> Option<String>) -> Self {
        Self { shape, key }
    }
}

impl KeyedBy<DomainRedirect> {
    /// Domain redirects keyed by their fully qualified source host.
    pub fn domains() -> Self {
        Self::new("cached_by_domain", fqdn_key)
    }
}

fn fqdn_key(rule: &DomainRedirect) -> Option<String> {
    let fqdn = rule.fqdn();
    (!fqdn.is_empty()).then_some(fqdn)
}

impl<R> std::fmt::Debug for KeyedBy<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedBy").field("shape", &self.shape).finish()
    }
}

#[async_trait]
impl<R: Rule> IndexStrategy for KeyedBy<R> {
    type Rule = R;
    type Index = KeyedIndex<R>;

    fn shape(&self) -> &'static str {
        self.shape
    }

    async fn load<S: ReadRuleStore<R>>(&self, store: &S) -> StorageResult<Vec<R>> {
        store.list_all().await
    }

    fn build(&self, records: Vec<R>) -> KeyedIndex<R> {
        let mut entries = HashMap::with_capacity(records.len());

        for record in records {
            let Some(key) = (self.key)(&record) else {
                continue;
            };
            let id = record.id();
            if let Some(replaced) = entries.insert(key.clone(), record) {
                warn!(
                    kind = R::KIND,
                    key = %key,
                    kept = ?id,
                    dropped = ?replaced.id(),
                    "Duplicate index key"
                );
            }
        }

        KeyedIndex {
            built_at: Timestamp::now(),
            entries,
        }
    }
}
