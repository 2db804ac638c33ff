use crate::error::StorageError;
use crate::rule::{OrderBy, Rule, RuleId};
use async_trait::async_trait;

/// Result type for backing store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of the rule records of one type.
///
/// This is all the redirector needs: indexes are always rebuilt from a
/// full scan of the table.
#[async_trait]
pub trait ReadRuleStore<R: Rule>: Send + Sync + 'static {
    /// Returns every record, in ascending id order.
    async fn list_all(&self) -> Result<Vec<R>>;

    /// Returns every record in ascending `order`, ties broken by ascending id.
    ///
    /// Returns `Err(Query)` if `R` has no such field.
    async fn list_all_ordered(&self, order: OrderBy) -> Result<Vec<R>>;

    /// Retrieves a single record. Returns `None` if it does not exist.
    async fn get(&self, id: RuleId) -> Result<Option<R>>;
}

#[async_trait]
pub trait RuleStore<R: Rule>: ReadRuleStore<R> {
    /// Inserts the rule, or replaces the stored record with the same id.
    /// Returns the rule as stored, with its id set.
    async fn upsert(&self, rule: R) -> Result<R>;

    /// Deletes the record. Returns `true` if it existed and was removed.
    async fn delete(&self, id: RuleId) -> Result<bool>;
}
