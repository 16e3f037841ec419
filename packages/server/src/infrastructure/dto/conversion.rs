//! Conversion logic from domain entities to DTOs.

use agora_shared::time::timestamp_to_rfc3339;

use crate::domain::{ResolvedGroup, ResolvedRoom, RoomSnapshot, User};
use crate::infrastructure::dto::http as dto;

impl From<&RoomSnapshot> for dto::RoomSummaryDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            name: room.name.to_string(),
            group: room.group.clone(),
            members: room.members.iter().map(ToString::to_string).collect(),
            created_at: timestamp_to_rfc3339(room.created_at),
        }
    }
}

impl From<User> for dto::UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            user_type: user.user_type,
            username: user.username,
            login_name: user.login_name,
            email: user.email,
            connected: user.connected,
            rooms: user.rooms.into_iter().collect(),
            groups: user.groups.into_iter().collect(),
        }
    }
}

impl From<ResolvedRoom> for dto::StoredRoomDto {
    fn from(resolved: ResolvedRoom) -> Self {
        Self {
            title: resolved.room.title,
            group: resolved.room.group,
            private: resolved.room.private,
            members: resolved
                .room
                .members
                .iter()
                .map(ToString::to_string)
                .collect(),
            users: resolved.users.into_values().map(Into::into).collect(),
        }
    }
}

impl From<ResolvedGroup> for dto::StoredGroupDto {
    fn from(resolved: ResolvedGroup) -> Self {
        Self {
            title: resolved.group.title,
            rooms: resolved.rooms.into_values().map(Into::into).collect(),
            users: resolved.users.into_values().map(Into::into).collect(),
        }
    }
}
