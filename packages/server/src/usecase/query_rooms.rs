//! UseCase: room queries over the in-memory directory

use std::{collections::BTreeSet, sync::Arc};

use crate::domain::{ClientId, ConnectionRegistry, RoomDirectory, RoomName, RoomSnapshot};

use super::error::QueryRoomError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomsUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// Every live room, ordered by name
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.directory.rooms().await
    }
}

/// A room together with which of its members are still connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room: RoomSnapshot,
    pub connected: BTreeSet<ClientId>,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Look a room up by name, with or without its `#` prefix
    pub async fn execute(&self, raw_name: &str) -> Result<RoomDetail, QueryRoomError> {
        let name = RoomName::new(raw_name)
            .map_err(|_| QueryRoomError::InvalidRoomName(raw_name.to_string()))?;
        let room = self
            .directory
            .get_room(&name)
            .await
            .ok_or_else(|| QueryRoomError::RoomNotFound(name.to_string()))?;

        let mut connected = BTreeSet::new();
        for member in &room.members {
            if self.registry.lookup(member).await.is_some() {
                connected.insert(*member);
            }
        }
        Ok(RoomDetail { room, connected })
    }
}
