use std::sync::Arc;

use crate::index::{CachedIndex, KeyedBy, OrderedBy};
use crate::location::{domain_location, replacement_location};
use crate::redirector::Redirector;
use crate::Result;
use async_trait::async_trait;
use tracing::{debug, trace};
use waypoint_core::{
    CompiledRegexRedirect, DomainRedirect, IndexCache, ReadRuleStore, RedirectDecision,
    RedirectRequest, RegexRedirect,
};

/// Domain redirects by fully qualified source host.
pub type DomainIndex<S, C> = CachedIndex<KeyedBy<DomainRedirect>, S, C>;

/// Compiled regex redirects by ascending priority.
pub type PathIndex<S, C> = CachedIndex<OrderedBy<RegexRedirect, CompiledRegexRedirect>, S, C>;

/// Resolves requests against the domain index first, then the path index.
#[derive(Debug)]
pub struct RedirectResolver<DS, PS, C> {
    domains: DomainIndex<DS, C>,
    paths: PathIndex<PS, C>,
}

impl<DS, PS, C> Clone for RedirectResolver<DS, PS, C> {
    fn clone(&self) -> Self {
        Self {
            domains: self.domains.clone(),
            paths: self.paths.clone(),
        }
    }
}

impl<DS, PS, C> RedirectResolver<DS, PS, C>
where
    DS: ReadRuleStore<DomainRedirect>,
    PS: ReadRuleStore<RegexRedirect>,
    C: IndexCache,
{
    pub fn new(domains: DomainIndex<DS, C>, paths: PathIndex<PS, C>) -> Self {
        Self { domains, paths }
    }

    /// Creates a resolver whose indexes are published to `cache` with the default TTL.
    pub fn from_stores(domain_store: Arc<DS>, path_store: Arc<PS>, cache: Arc<C>) -> Self {
        Self::new(
            CachedIndex::new(KeyedBy::domains(), domain_store, Arc::clone(&cache)),
            CachedIndex::new(OrderedBy::regex_rules(), path_store, cache),
        )
    }

    pub fn domains(&self) -> &DomainIndex<DS, C> {
        &self.domains
    }

    pub fn paths(&self) -> &PathIndex<PS, C> {
        &self.paths
    }

    /// Redirects a request whose host has a domain redirect to the target
    /// domain, keeping scheme, path and (for `GET`) query.
    pub async fn resolve_domain(
        &self,
        request: &RedirectRequest,
    ) -> Result<Option<RedirectDecision>> {
        let index = self.domains.get().await?;

        let Some(rule) = index.get(&request.host) else {
            trace!(host = %request.host, "No domain redirect");
            return Ok(None);
        };

        let location = domain_location(request, &rule.target_domain);
        debug!(host = %request.host, %location, kind = %rule.kind, "Matched domain redirect");
        Ok(Some(RedirectDecision::new(rule.kind, location)))
    }

    /// Redirects to the replacement of the first rule, in priority order,
    /// whose pattern is found in `path`. Non-ASCII in the replacement is
    /// percent-encoded.
    pub async fn resolve_path(&self, path: &str) -> Result<Option<RedirectDecision>> {
        let index = self.paths.get().await?;

        let Some(entry) = index.iter().find(|entry| entry.is_match(path)) else {
            trace!(path, "No path redirect");
            return Ok(None);
        };

        let rule = entry.rule();
        let location = replacement_location(&rule.replacement);
        debug!(
            path,
            pattern = %rule.pattern,
            %location,
            kind = %rule.kind,
            "Matched path redirect"
        );
        Ok(Some(RedirectDecision::new(rule.kind, location)))
    }
}

#[async_trait]
impl<DS, PS, C> Redirector for RedirectResolver<DS, PS, C>
where
    DS: ReadRuleStore<DomainRedirect>,
    PS: ReadRuleStore<RegexRedirect>,
    C: IndexCache,
{
    async fn resolve(&self, request: &RedirectRequest) -> Result<Option<RedirectDecision>> {
        if let Some(decision) = self.resolve_domain(request).await? {
            return Ok(Some(decision));
        }
        self.resolve_path(&request.path).await
    }
}
