//! Key-value store implementations and the algorithms that sit directly on
//! top of the store port.
//!
//! - `keys`: the hierarchical key scheme
//! - `memory`: in-process store, used when no Redis URL is configured
//! - `redis`: Redis-backed store
//! - `reconcile`: delta-based set synchronization
//! - `resp`: RESP command encoding for bulk loading

pub mod keys;
pub mod memory;
pub mod reconcile;
pub mod redis;
pub mod resp;

pub use memory::MemoryStore;
pub use reconcile::{SetDelta, reconcile_set};
pub use redis::RedisStore;
