//! Persistence adapter: maps users, rooms and groups onto hashes and sets
//! in the key-value store and keeps membership sets reconciled.
//!
//! Writes put the scalar hash fields synchronously and hand the membership
//! sets to a [`SyncWorker`] which reconciles them in the background. Store
//! failures never surface to the in-memory operation that caused the write;
//! they are logged and counted in [`PersistenceHealth`].

pub mod adapter;
pub mod bulk;
pub mod codec;
pub mod health;
pub mod mirror;
pub mod worker;

pub use adapter::PersistenceAdapter;
pub use health::{HealthSnapshot, PersistenceHealth};
pub use mirror::StoreMirror;
pub use worker::{SyncScheduler, SyncWorker};
