//! Disposable containers for Waypoint integration tests.
//!
//! Every fixture needs a reachable Docker daemon; tests built on them are
//! marked `#[ignore]` and run with `cargo test -- --ignored`.
//!
//! - [`mysql::MySqlDatabase`] hands out a connected pool with a schema
//!   already applied.
//! - [`redis::RedisServer`] hands out multiplexed connections.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
