//! UseCase layer: one struct per operation, wired against the domain ports.

mod connect_client;
mod disconnect_client;
mod error;
mod inspect_store;
mod query_rooms;
mod route_envelope;

pub use connect_client::{ConnectClientUseCase, ConnectedClient};
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{InspectStoreError, QueryRoomError};
pub use inspect_store::InspectStoreUseCase;
pub use query_rooms::{GetRoomDetailUseCase, GetRoomsUseCase, RoomDetail};
pub use route_envelope::{RouteEnvelopeUseCase, RouterSettings};

use crate::domain::{ClientId, RoomDirectory, User};

/// The guest record of a connected client as the directory currently sees it
async fn current_user(directory: &dyn RoomDirectory, client_id: ClientId) -> User {
    let mut user = User::guest(client_id);
    for name in directory.rooms_of(&client_id).await {
        if let Some(room) = directory.get_room(&name).await {
            user.groups.insert(room.group);
        }
        user.rooms.insert(name.into_string());
    }
    user
}
