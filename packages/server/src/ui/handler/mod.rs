//! Request handlers.

mod http;
mod websocket;

pub use http::{
    delete_stored_user, get_room_detail, get_rooms, get_stored_group, get_stored_room,
    get_stored_user, health_check,
};
pub use websocket::websocket_handler;
