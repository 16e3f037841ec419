//! HTTP API response DTOs.

use serde::Serialize;

use crate::infrastructure::persistence::HealthSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthDto {
    /// `"ok"`, or `"degraded"` while the store keeps failing
    pub status: &'static str,
    pub connected_clients: usize,
    pub persistence: HealthSnapshot,
}

/// Room as listed by `GET /api/rooms`
#[derive(Debug, Serialize)]
pub struct RoomSummaryDto {
    pub name: String,
    pub group: String,
    pub members: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct RoomDetailDto {
    pub name: String,
    pub group: String,
    pub private: bool,
    pub members: Vec<MemberDto>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct MemberDto {
    pub client_id: String,
    /// Whether the member still has a live connection
    pub connected: bool,
}

/// Stored user record. Credentials are never exposed.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub username: String,
    pub login_name: String,
    pub email: String,
    pub connected: bool,
    pub rooms: Vec<String>,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StoredRoomDto {
    pub title: String,
    pub group: String,
    pub private: bool,
    pub members: Vec<String>,
    pub users: Vec<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct StoredGroupDto {
    pub title: String,
    pub rooms: Vec<StoredRoomDto>,
    pub users: Vec<UserDto>,
}
