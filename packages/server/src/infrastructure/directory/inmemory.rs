//! In-memory room/group directory.
//!
//! Keeps both directions of the membership relation so that disconnect
//! cleanup does not scan every room:
//!
//! - `room → members`: who receives a broadcast
//! - `client → rooms`: what to leave on disconnect
//!
//! Both maps live behind one lock, so a broadcast snapshot never observes a
//! half-applied join or part.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use agora_shared::time::{Clock, SystemClock};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientId, DirectoryError, GroupSnapshot, JoinOutcome, PartOutcome, RoomDirectory, RoomName,
    RoomSnapshot,
};

/// Group assigned to rooms created through the router
pub const DEFAULT_GROUP: &str = "default";

/// Directory behaviour knobs
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    /// Group recorded on every room this directory creates
    pub default_group: String,
    /// Keep rooms around after their last member leaves
    pub retain_empty_rooms: bool,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            default_group: DEFAULT_GROUP.to_string(),
            retain_empty_rooms: false,
        }
    }
}

#[derive(Debug)]
struct RoomState {
    group: String,
    private: bool,
    members: BTreeSet<ClientId>,
    created_at: i64,
}

impl RoomState {
    fn snapshot(&self, name: &RoomName) -> RoomSnapshot {
        RoomSnapshot {
            name: name.clone(),
            group: self.group.clone(),
            private: self.private,
            members: self.members.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    rooms: HashMap<RoomName, RoomState>,
    client_rooms: HashMap<ClientId, BTreeSet<RoomName>>,
}

impl DirectoryState {
    /// Remove `client_id` from `name`, collecting the room when it empties.
    ///
    /// The caller has checked that the client is a member.
    fn detach(
        &mut self,
        name: &RoomName,
        client_id: &ClientId,
        retain_empty: bool,
    ) -> Option<PartOutcome> {
        let room = self.rooms.get_mut(name)?;
        room.members.remove(client_id);
        let snapshot = room.snapshot(name);

        if let Some(rooms) = self.client_rooms.get_mut(client_id) {
            rooms.remove(name);
            if rooms.is_empty() {
                self.client_rooms.remove(client_id);
            }
        }

        let collected = snapshot.members.is_empty() && !retain_empty;
        if collected {
            self.rooms.remove(name);
        }

        Some(PartOutcome {
            room: snapshot,
            collected,
        })
    }
}

/// In-memory directory of rooms and their members
pub struct InMemoryRoomDirectory {
    state: Mutex<DirectoryState>,
    settings: DirectorySettings,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomDirectory {
    pub fn new(settings: DirectorySettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: DirectorySettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(DirectoryState::default()),
            settings,
            clock,
        }
    }

    fn new_room(&self) -> RoomState {
        RoomState {
            group: self.settings.default_group.clone(),
            private: false,
            members: BTreeSet::new(),
            created_at: self.clock.now_unix_millis(),
        }
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new(DirectorySettings::default())
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn get_or_create_room(&self, name: &RoomName) -> RoomSnapshot {
        let mut state = self.state.lock().await;
        if let Some(room) = state.rooms.get(name) {
            return room.snapshot(name);
        }
        let room = self.new_room();
        let snapshot = room.snapshot(name);
        state.rooms.insert(name.clone(), room);
        tracing::info!("Room '{}' created in group '{}'", name, snapshot.group);
        snapshot
    }

    async fn get_room(&self, name: &RoomName) -> Option<RoomSnapshot> {
        let state = self.state.lock().await;
        state.rooms.get(name).map(|room| room.snapshot(name))
    }

    async fn join(&self, name: &RoomName, client_id: ClientId) -> JoinOutcome {
        let mut state = self.state.lock().await;

        let created = !state.rooms.contains_key(name);
        let room = state
            .rooms
            .entry(name.clone())
            .or_insert_with(|| self.new_room());
        if created {
            tracing::info!("Room '{}' created in group '{}'", name, room.group);
        }
        let newly_joined = room.members.insert(client_id);
        let snapshot = room.snapshot(name);

        state
            .client_rooms
            .entry(client_id)
            .or_default()
            .insert(name.clone());

        JoinOutcome {
            room: snapshot,
            created,
            newly_joined,
        }
    }

    async fn part(
        &self,
        name: &RoomName,
        client_id: &ClientId,
    ) -> Result<PartOutcome, DirectoryError> {
        let mut state = self.state.lock().await;

        let room = state
            .rooms
            .get(name)
            .ok_or_else(|| DirectoryError::RoomNotFound(name.to_string()))?;
        if !room.members.contains(client_id) {
            return Err(DirectoryError::NotAMember(name.to_string()));
        }

        state
            .detach(name, client_id, self.settings.retain_empty_rooms)
            .ok_or_else(|| DirectoryError::RoomNotFound(name.to_string()))
    }

    async fn rooms_of(&self, client_id: &ClientId) -> Vec<RoomName> {
        let state = self.state.lock().await;
        state
            .client_rooms
            .get(client_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn remove_client(&self, client_id: &ClientId) -> Vec<PartOutcome> {
        let mut state = self.state.lock().await;
        let rooms = state.client_rooms.get(client_id).cloned().unwrap_or_default();
        rooms
            .iter()
            .filter_map(|name| state.detach(name, client_id, self.settings.retain_empty_rooms))
            .collect()
    }

    async fn rooms(&self) -> Vec<RoomSnapshot> {
        let state = self.state.lock().await;
        let mut rooms: Vec<RoomSnapshot> = state
            .rooms
            .iter()
            .map(|(name, room)| room.snapshot(name))
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    async fn group(&self, title: &str) -> GroupSnapshot {
        let state = self.state.lock().await;
        let mut rooms = BTreeSet::new();
        let mut users = BTreeSet::new();
        for (name, room) in state.rooms.iter().filter(|(_, room)| room.group == title) {
            rooms.insert(name.clone());
            users.extend(room.members.iter().copied());
        }
        GroupSnapshot {
            title: title.to_string(),
            rooms,
            users,
        }
    }
}
