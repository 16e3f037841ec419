//! Domain layer: value objects, entities, error types and the ports the
//! use cases depend on. Infrastructure provides the implementations.

pub mod directory;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod mirror;
pub mod registry;
pub mod reply;
pub mod store;
pub mod value_object;

pub use directory::{GroupSnapshot, JoinOutcome, PartOutcome, RoomDirectory, RoomSnapshot};
pub use entity::{Group, ResolvedGroup, ResolvedRoom, Room, User};
pub use envelope::{Action, Envelope};
pub use error::{DirectoryError, RegistryError, StoreError, ValueObjectError};
pub use mirror::{MembershipMirror, MirrorEvent};
#[cfg(test)]
pub use mirror::MockMembershipMirror;
pub use registry::{ConnectionRegistry, OutboundChannel};
pub use reply::{Reply, ReplyKind, ResponseCode};
pub use store::{EntityStore, KeyValueStore};
pub use value_object::{ClientId, RoomName};
