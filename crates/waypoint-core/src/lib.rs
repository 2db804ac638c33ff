//! Core types and traits for the Waypoint redirect service.
//!
//! This crate provides the redirect rule models together with the backing
//! store and index cache contracts shared by the redirector, the storage
//! backends and the gateway.

pub mod cache;
pub mod domain;
pub mod error;
pub mod path;
pub mod request;
pub mod rule;
pub mod store;

pub use cache::{CacheValue, IndexCache, FOREVER};
pub use domain::DomainRedirect;
pub use error::{CacheError, RuleError, StorageError};
pub use path::{CompiledRegexRedirect, Priority, RegexRedirect};
pub use request::{RedirectDecision, RedirectRequest};
pub use rule::{OrderBy, RedirectKind, Rule, RuleId};
pub use store::{ReadRuleStore, RuleStore};
