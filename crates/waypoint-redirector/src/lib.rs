//! Redirect decisions backed by cached rule indexes.
//!
//! Rules are read through two [`CachedIndex`]es: an exact-match index of
//! domain redirects keyed by fully qualified host, and a priority-ordered
//! list of precompiled regex path redirects. Indexes are published to an
//! [`IndexCache`](waypoint_core::IndexCache) and rebuilt wholesale by
//! [`RuleService`] after every write.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint_cache::MokaIndexCache;
//! use waypoint_core::{DomainRedirect, RedirectKind, RedirectRequest, RegexRedirect};
//! use waypoint_redirector::{RedirectResolver, Redirector, RuleService};
//! use waypoint_storage::InMemoryRuleStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(MokaIndexCache::new());
//! let domains = Arc::new(InMemoryRuleStore::new());
//! let paths = Arc::new(InMemoryRuleStore::<RegexRedirect>::new());
//!
//! // Writes go through the rule service, which republishes the index
//! let service = RuleService::domains(Arc::clone(&domains), Arc::clone(&cache));
//! service
//!     .save(DomainRedirect::new("www.", "example.com", RedirectKind::Permanent))
//!     .await?;
//!
//! let resolver = RedirectResolver::from_stores(domains, paths, cache);
//! let request = RedirectRequest::builder()
//!     .host("www.example.com")
//!     .path("/docs")
//!     .build();
//!
//! if let Some(decision) = resolver.resolve(&request).await? {
//!     println!("{} {}", decision.status_code(), decision.location);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod index;
pub mod location;
pub mod redirector;
pub mod resolver;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{RedirectorError, Result};
pub use index::{CachedIndex, IndexStrategy, KeyedBy, KeyedIndex, OrderedBy, OrderedIndex};
pub use redirector::Redirector;
pub use resolver::{DomainIndex, PathIndex, RedirectResolver};
pub use service::RuleService;
