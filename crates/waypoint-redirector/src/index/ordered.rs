use super::IndexStrategy;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::marker::PhantomData;
use tracing::warn;
use waypoint_core::store::Result as StorageResult;
use waypoint_core::{CacheValue, CompiledRegexRedirect, OrderBy, ReadRuleStore, RegexRedirect, Rule};

/// Index entries in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedIndex<E> {
    built_at: Timestamp,
    entries: Vec<E>,
}

impl<E> OrderedIndex<E> {
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
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

/// Builds an [`OrderedIndex`] from the store's ordered listing, converting
/// every record into an `E`.
///
/// Records that fail to convert are logged and left out; the rest of the
/// index is still built.
pub struct OrderedBy<R, E> {
    shape: &'static str,
    order: OrderBy,
    _entry: PhantomData<fn(R) -> E>,
}

impl<R, E> OrderedBy<R, E> {
    pub const fn new(shape: &'static str, order: OrderBy) -> Self {
        Self {
            shape,
            order,
            _entry: PhantomData,
        }
    }

    pub const fn order(&self) -> OrderBy {
        self.order
    }
}

impl OrderedBy<RegexRedirect, CompiledRegexRedirect> {
    /// Regex rules by ascending priority, compiled once per build.
    pub const fn regex_rules() -> Self {
        Self::new("ordered_by_priority", OrderBy::Priority)
    }
}

impl<R, E> std::fmt::Debug for OrderedBy<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedBy")
            .field("shape", &self.shape)
            .field("order", &self.order)
            .finish()
    }
}

#[async_trait]
impl<R, E> IndexStrategy for OrderedBy<R, E>
where
    R: Rule,
    E: TryFrom<R> + CacheValue,
    E::Error: Display,
{
    type Rule = R;
    type Index = OrderedIndex<E>;

    fn shape(&self) -> &'static str {
        self.shape
    }

    async fn load<S: ReadRuleStore<R>>(&self, store: &S) -> StorageResult<Vec<R>> {
        store.list_all_ordered(self.order).await
    }

    fn build(&self, records: Vec<R>) -> OrderedIndex<E> {
        let entries = records
            .into_iter()
            .filter_map(|record| {
                let id = record.id();
                match E::try_from(record) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(kind = R::KIND, id = ?id, error = %e, "Skipping malformed record");
                        None
                    }
                }
            })
            .collect();

        OrderedIndex {
            built_at: Timestamp::now(),
            entries,
        }
    }
}
