//! Connection registry port.
//!
//! The registry is the authoritative table of live connections. Every
//! connection task reads and mutates it concurrently, so implementations
//! must serialize access internally.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::{error::RegistryError, value_object::ClientId};

/// Bounded queue feeding one connection's transport writer
pub type OutboundChannel = mpsc::Sender<Bytes>;

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Store the connection under a fresh identifier that collides with no
    /// live entry, and return that identifier.
    async fn register(&self, channel: OutboundChannel) -> ClientId;

    /// Remove the entry. Idempotent; returns whether an entry was removed.
    async fn unregister(&self, client_id: &ClientId) -> bool;

    /// Resolve a send target
    async fn lookup(&self, client_id: &ClientId) -> Option<OutboundChannel>;

    /// Queue `payload` for the client's connection.
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown at call
    /// time, which covers clients that disconnected after a membership
    /// snapshot was taken.
    async fn send(&self, client_id: &ClientId, payload: Bytes) -> Result<(), RegistryError>;

    async fn count(&self) -> usize;
}
