//! Room/group directory port.
//!
//! Rooms are keyed by name alone; the group a room belongs to is recorded on
//! the room and used when mirroring it, but never takes part in lookups.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{
    entity::{Group, Room},
    error::DirectoryError,
    value_object::{ClientId, RoomName},
};

/// Point-in-time copy of one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub group: String,
    pub private: bool,
    pub members: BTreeSet<ClientId>,
    /// Unix milliseconds
    pub created_at: i64,
}

impl RoomSnapshot {
    pub fn is_member(&self, client_id: &ClientId) -> bool {
        self.members.contains(client_id)
    }

    /// Record to mirror into the store
    pub fn to_record(&self) -> Room {
        Room {
            title: self.name.as_str().to_string(),
            group: self.group.clone(),
            private: self.private,
            members: self.members.clone(),
        }
    }
}

/// Point-in-time copy of one group: its rooms and the union of their members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub title: String,
    pub rooms: BTreeSet<RoomName>,
    pub users: BTreeSet<ClientId>,
}

impl GroupSnapshot {
    pub fn to_record(&self) -> Group {
        Group {
            title: self.title.clone(),
            rooms: self.rooms.iter().map(|r| r.as_str().to_string()).collect(),
            users: self.users.clone(),
        }
    }
}

/// Result of a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The room after the join
    pub room: RoomSnapshot,
    /// The room did not exist before this join
    pub created: bool,
    /// The client was not already a member
    pub newly_joined: bool,
}

/// Result of removing a client from a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOutcome {
    /// The room after the removal
    pub room: RoomSnapshot,
    /// The room became empty and was dropped from the directory
    pub collected: bool,
}

#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Resolve the room, creating it empty when absent
    async fn get_or_create_room(&self, name: &RoomName) -> RoomSnapshot;

    async fn get_room(&self, name: &RoomName) -> Option<RoomSnapshot>;

    /// Idempotent insert, creating the room when absent. Creation and
    /// insert happen under one critical section.
    async fn join(&self, name: &RoomName, client_id: ClientId) -> JoinOutcome;

    /// Fails with [`DirectoryError::RoomNotFound`] when the room does not
    /// exist and [`DirectoryError::NotAMember`] when the client is absent.
    async fn part(
        &self,
        name: &RoomName,
        client_id: &ClientId,
    ) -> Result<PartOutcome, DirectoryError>;

    /// Rooms the client currently belongs to
    async fn rooms_of(&self, client_id: &ClientId) -> Vec<RoomName>;

    /// Remove the client from every room it joined
    async fn remove_client(&self, client_id: &ClientId) -> Vec<PartOutcome>;

    /// Every room, sorted by name
    async fn rooms(&self) -> Vec<RoomSnapshot>;

    async fn group(&self, title: &str) -> GroupSnapshot;
}
