//! Room/group directory implementations.

pub mod inmemory;

pub use inmemory::{DirectorySettings, InMemoryRoomDirectory};
