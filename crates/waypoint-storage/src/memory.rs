use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;
use waypoint_core::error::StorageError;
use waypoint_core::rule::{OrderBy, Rule, RuleId};
use waypoint_core::store::{ReadRuleStore, Result, RuleStore};

/// In-memory rule store backed by a [`DashMap`].
///
/// Ids are handed out from a counter starting at 1, mirroring an
/// auto-increment column. Upserting a rule that already carries an id
/// writes it under that id and moves the counter past it.
#[derive(Debug)]
pub struct InMemoryRuleStore<R> {
    storage: DashMap<RuleId, R>,
    next_id: AtomicI64,
}

impl<R: Rule> InMemoryRuleStore<R> {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored rules.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn snapshot(&self) -> Vec<R> {
        let mut rules: Vec<R> = self
            .storage
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rules.sort_by_key(|rule| rule.order_value(OrderBy::Id));
        rules
    }
}

impl<R: Rule> Default for InMemoryRuleStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Rule> ReadRuleStore<R> for InMemoryRuleStore<R> {
    async fn list_all(&self) -> Result<Vec<R>> {
        Ok(self.snapshot())
    }

    async fn list_all_ordered(&self, order: OrderBy) -> Result<Vec<R>> {
        if !R::orderable_by(order) {
            return Err(StorageError::Query(format!(
                "{} records cannot be ordered by '{order}'",
                R::KIND
            )));
        }

        // Snapshot is in id order and the sort is stable, so ties keep id order.
        let mut rules = self.snapshot();
        rules.sort_by_key(|rule| rule.order_value(order));
        Ok(rules)
    }

    async fn get(&self, id: RuleId) -> Result<Option<R>> {
        Ok(self.storage.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl<R: Rule> RuleStore<R> for InMemoryRuleStore<R> {
    async fn upsert(&self, rule: R) -> Result<R> {
        let rule = match rule.id() {
            Some(id) => {
                self.next_id.fetch_max(id.get().saturating_add(1), Ordering::SeqCst);
                rule
            }
            None => {
                let id = RuleId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
                rule.with_id(id)
            }
        };

        let Some(id) = rule.id() else {
            return Err(StorageError::InvalidData(format!(
                "{} record has no id after assignment",
                R::KIND
            )));
        };

        trace!(kind = R::KIND, %id, "Upserting rule in memory");
        self.storage.insert(id, rule.clone());
        Ok(rule)
    }

    async fn delete(&self, id: RuleId) -> Result<bool> {
        Ok(self.storage.remove(&id).is_some())
    }
}
