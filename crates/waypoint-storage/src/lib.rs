//! Backing stores for redirect rules.
//!
//! - [`InMemoryRuleStore`] keeps rules in a sharded map. Used for local runs
//!   and tests.
//! - [`MySqlRuleStore`] persists rules in MySQL. The table definitions live
//!   in `ddl/mysql` and are exported as [`mysql::SCHEMA`].

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRuleStore;
pub use mysql::{MySqlRule, MySqlRuleStore};
pub use waypoint_core::error::StorageError;
pub use waypoint_core::store::{ReadRuleStore, Result, RuleStore};
