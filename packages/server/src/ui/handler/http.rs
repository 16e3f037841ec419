//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::{
        HealthDto, MemberDto, RoomDetailDto, RoomSummaryDto, StoredGroupDto, StoredRoomDto,
        UserDto,
    },
    ui::state::AppState,
    usecase::{InspectStoreError, QueryRoomError},
};
use agora_shared::time::timestamp_to_rfc3339;

fn store_status(error: InspectStoreError) -> StatusCode {
    match error {
        InspectStoreError::InvalidClientId(_) => StatusCode::BAD_REQUEST,
        InspectStoreError::UserNotFound(_) | InspectStoreError::RoomNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        InspectStoreError::Store(e) => {
            tracing::error!("Store request failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    let persistence = state.health.snapshot();
    Json(HealthDto {
        status: if persistence.healthy { "ok" } else { "degraded" },
        connected_clients: state.registry.count().await,
        persistence,
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(&room).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            let members = detail
                .room
                .members
                .iter()
                .map(|id| MemberDto {
                    client_id: id.to_string(),
                    connected: detail.connected.contains(id),
                })
                .collect();
            Ok(Json(RoomDetailDto {
                name: detail.room.name.to_string(),
                group: detail.room.group.clone(),
                private: detail.room.private,
                members,
                created_at: timestamp_to_rfc3339(detail.room.created_at),
            }))
        }
        Err(QueryRoomError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(QueryRoomError::InvalidRoomName(_)) => Err(StatusCode::BAD_REQUEST),
    }
}

/// Get a stored user record
pub async fn get_stored_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, StatusCode> {
    state
        .inspect_store_usecase
        .get_user(&id)
        .await
        .map(|user| Json(user.into()))
        .map_err(store_status)
}

/// Delete a stored user record and its membership sets
pub async fn delete_stored_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .inspect_store_usecase
        .delete_user(&id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(store_status)
}

/// Get a stored room with its resolved members
pub async fn get_stored_room(
    State(state): State<Arc<AppState>>,
    Path((group, room)): Path<(String, String)>,
) -> Result<Json<StoredRoomDto>, StatusCode> {
    state
        .inspect_store_usecase
        .get_room(&group, &room)
        .await
        .map(|room| Json(room.into()))
        .map_err(store_status)
}

/// Get a stored group with its rooms and users
pub async fn get_stored_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<Json<StoredGroupDto>, StatusCode> {
    state
        .inspect_store_usecase
        .get_group(&group)
        .await
        .map(|group| Json(group.into()))
        .map_err(store_status)
}
