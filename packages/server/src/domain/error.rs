//! Error types for the domain layer.

use thiserror::Error;

/// Errors raised while constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("invalid client id '{0}'")]
    InvalidClientId(String),

    #[error("invalid room name '{0}'")]
    InvalidRoomName(String),
}

/// Errors from the connection registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The id is not registered (never was, or already disconnected)
    #[error("client '{0}' not found")]
    NotFound(String),

    /// The client's outbound queue is full and the message was not queued
    #[error("outbound queue for client '{0}' is full")]
    QueueFull(String),

    /// The client's writer has gone away
    #[error("connection for client '{0}' is closed")]
    Closed(String),
}

/// Errors from the room/group directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("client is not a member of room '{0}'")]
    NotAMember(String),
}

/// Errors from the external key-value store and the persistence adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store rejected or failed a request
    #[error("store backend error: {0}")]
    Backend(String),

    /// A record was found but could not be decoded into an entity
    #[error("corrupt record at '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
