//! UseCase errors.

use thiserror::Error;

use crate::domain::StoreError;

/// Error returned by the room query use cases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryRoomError {
    #[error("invalid room name '{0}'")]
    InvalidRoomName(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// Error returned by the store inspection use cases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectStoreError {
    #[error("invalid client id '{0}'")]
    InvalidClientId(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
