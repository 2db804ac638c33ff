use std::sync::Arc;

use crate::index::{CachedIndex, IndexStrategy, KeyedBy, OrderedBy};
use crate::Result;
use tracing::{debug, info};
use waypoint_core::{
    CompiledRegexRedirect, DomainRedirect, IndexCache, RegexRedirect, Rule, RuleId, RuleStore,
};

/// Write path for one rule type.
///
/// Every committed write rebuilds and republishes the index before
/// returning, so the next lookup in any process sharing the cache sees it.
pub struct RuleService<St, S, C> {
    store: Arc<S>,
    index: CachedIndex<St, S, C>,
}

impl<St, S, C> RuleService<St, S, C>
where
    St: IndexStrategy,
    S: RuleStore<St::Rule>,
    C: IndexCache,
{
    pub fn new(strategy: St, store: Arc<S>, cache: Arc<C>) -> Self {
        let index = CachedIndex::new(strategy, Arc::clone(&store), cache);
        Self { store, index }
    }

    /// The index this service keeps up to date.
    pub fn index(&self) -> &CachedIndex<St, S, C> {
        &self.index
    }

    /// Normalizes, validates and stores the rule, then rebuilds the index.
    ///
    /// Returns the rule as stored, with its id set.
    pub async fn save(&self, rule: St::Rule) -> Result<St::Rule> {
        let rule = rule.normalize();
        rule.validate()?;

        let saved = self.store.upsert(rule).await?;
        info!(
            kind = <St::Rule as Rule>::KIND,
            id = ?saved.id(),
            "Saved rule"
        );

        self.index.rebuild().await?;
        Ok(saved)
    }

    /// Deletes the rule and, if it existed, rebuilds the index.
    ///
    /// Returns `true` if a rule was removed.
    pub async fn delete(&self, id: RuleId) -> Result<bool> {
        let removed = self.store.delete(id).await?;

        if removed {
            info!(kind = <St::Rule as Rule>::KIND, %id, "Deleted rule");
            self.index.rebuild().await?;
        } else {
            debug!(kind = <St::Rule as Rule>::KIND, %id, "Rule to delete not found");
        }

        Ok(removed)
    }

    /// Rebuilds and republishes the index from the store.
    pub async fn rebuild(&self) -> Result<()> {
        self.index.rebuild().await.map(|_| ())
    }
}

impl<S, C> RuleService<KeyedBy<DomainRedirect>, S, C>
where
    S: RuleStore<DomainRedirect>,
    C: IndexCache,
{
    pub fn domains(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(KeyedBy::domains(), store, cache)
    }
}

impl<S, C> RuleService<OrderedBy<RegexRedirect, CompiledRegexRedirect>, S, C>
where
    S: RuleStore<RegexRedirect>,
    C: IndexCache,
{
    pub fn regex_rules(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(OrderedBy::regex_rules(), store, cache)
    }
}

impl<St, S, C> std::fmt::Debug for RuleService<St, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleService")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RedirectorError;
    use crate::resolver::RedirectResolver;
    use crate::test_support::{CountingCache, CountingStore};
    use crate::Redirector;
    use waypoint_core::{Priority, ReadRuleStore, RedirectKind, RedirectRequest, RuleError};

    fn domain_service() -> (
        RuleService<KeyedBy<DomainRedirect>, CountingStore<DomainRedirect>, CountingCache>,
        Arc<CountingStore<DomainRedirect>>,
        Arc<CountingCache>,
    ) {
        let store = Arc::new(CountingStore::new());
        let cache = Arc::new(CountingCache::new());
        let service = RuleService::domains(Arc::clone(&store), Arc::clone(&cache));
        (service, store, cache)
    }

    #[tokio::test]
    async fn save_is_visible_to_the_next_lookup() {
        let (service, _, _) = domain_service();
        let index = service.index().clone();

        assert!(index.get().await.unwrap().is_empty());

        let saved = service
            .save(DomainRedirect::new("www.", "example.com", RedirectKind::Permanent))
            .await
            .unwrap();
        assert!(saved.id.is_some());

        let current = index.get().await.unwrap();
        assert_eq!(current.get("www.example.com"), Some(&saved));
    }

    #[tokio::test]
    async fn update_replaces_indexed_rule() {
        let (service, _, _) = domain_service();
        let saved = service
            .save(DomainRedirect::new("a.com", "b.com", RedirectKind::Permanent))
            .await
            .unwrap();

        let mut changed = saved.clone();
        changed.target_domain = "c.com".to_string();
        changed.kind = RedirectKind::Temporary;
        service.save(changed).await.unwrap();

        let current = service.index().get().await.unwrap();
        let rule = current.get("a.com").unwrap();
        assert_eq!(rule.target_domain, "c.com");
        assert_eq!(rule.kind, RedirectKind::Temporary);
    }

    #[tokio::test]
    async fn delete_removes_rule_from_index() {
        let (service, _, cache) = domain_service();
        let saved = service
            .save(DomainRedirect::new("a.com", "b.com", RedirectKind::Permanent))
            .await
            .unwrap();
        assert!(service.index().get().await.unwrap().get("a.com").is_some());

        assert!(service.delete(saved.id.unwrap()).await.unwrap());
        assert!(service.index().get().await.unwrap().get("a.com").is_none());
        assert_eq!(cache.sets(), 2);
    }

    #[tokio::test]
    async fn deleting_missing_rule_does_not_rebuild() {
        let (service, store, cache) = domain_service();

        assert!(!service.delete(RuleId::new(404)).await.unwrap());
        assert_eq!(store.loads(), 0);
        assert_eq!(cache.sets(), 0);
    }

    #[tokio::test]
    async fn invalid_rule_is_rejected_before_write() {
        let store = Arc::new(CountingStore::<RegexRedirect>::new());
        let cache = Arc::new(CountingCache::new());
        let service = RuleService::regex_rules(Arc::clone(&store), Arc::clone(&cache));

        let err = service
            .save(RegexRedirect::new("([unclosed", "/x", RedirectKind::Permanent))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RedirectorError::InvalidRule(RuleError::InvalidPattern { .. })
        ));
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(cache.sets(), 0);
    }

    #[tokio::test]
    async fn save_trims_fields() {
        let store = Arc::new(CountingStore::<RegexRedirect>::new());
        let service = RuleService::regex_rules(Arc::clone(&store), Arc::new(CountingCache::new()));

        let mut rule = RegexRedirect::new("^/a$", "/b", RedirectKind::Permanent);
        rule.pattern = "  ^/a$ ".to_string();
        rule.replacement = " /b\n".to_string();

        let saved = service.save(rule).await.unwrap();
        assert_eq!(saved.pattern, "^/a$");
        assert_eq!(saved.replacement, "/b");
    }

    #[tokio::test]
    async fn failed_rebuild_surfaces_after_commit() {
        let (service, store, _) = domain_service();
        store.fail(true);

        let err = service
            .save(DomainRedirect::new("a.com", "b.com", RedirectKind::Permanent))
            .await
            .unwrap_err();
        assert!(matches!(err, RedirectorError::Rebuild { .. }));

        store.fail(false);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn priority_change_reorders_path_rules() {
        let store = Arc::new(CountingStore::<RegexRedirect>::new());
        let cache = Arc::new(CountingCache::new());
        let service = RuleService::regex_rules(Arc::clone(&store), Arc::clone(&cache));
        let resolver = RedirectResolver::from_stores(
            Arc::new(CountingStore::<DomainRedirect>::new()),
            Arc::clone(&store),
            Arc::clone(&cache),
        );

        service
            .save(RegexRedirect::new("^/a", "/first", RedirectKind::Permanent))
            .await
            .unwrap();
        let second = service
            .save(
                RegexRedirect::new("^/a", "/second", RedirectKind::Permanent)
                    .with_priority(Priority::new(50).unwrap()),
            )
            .await
            .unwrap();

        let request = RedirectRequest::builder().host("x.test").path("/a").build();
        let decision = resolver.resolve(&request).await.unwrap().unwrap();
        assert_eq!(decision.location, "/second");

        service
            .save(second.with_priority(Priority::default()))
            .await
            .unwrap();
        let decision = resolver.resolve(&request).await.unwrap().unwrap();
        assert_eq!(decision.location, "/first");

        let ordered = service.index().get().await.unwrap();
        let priorities: Vec<u8> = ordered.iter().map(|e| e.rule().priority.get()).collect();
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
    }
}
