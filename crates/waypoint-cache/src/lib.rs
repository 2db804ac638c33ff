//! [`IndexCache`](waypoint_core::IndexCache) implementations shared across
//! Waypoint services.
//!
//! - [`MokaIndexCache`] keeps published indexes in process. Suitable for a
//!   single node, or for tests.
//! - [`RedisIndexCache`] publishes indexes to Redis so that every process
//!   serving redirects sees a rebuild triggered by any writer.

pub mod moka;
pub mod redis;

pub use self::moka::MokaIndexCache;
pub use self::redis::RedisIndexCache;
pub use waypoint_core::error::CacheError;
pub use waypoint_core::cache::Result;
