//! Key scheme for entities mirrored into the store.
//!
//! | Entity        | Key                             | Kind |
//! |---------------|---------------------------------|------|
//! | User record   | `user-<type>-<loginname>-<id>`  | hash |
//! | User's rooms  | `user-<type>-<id>-rooms`        | set  |
//! | User's groups | `user-<type>-<id>-groups`       | set  |
//! | Room info     | `room-<group>-<room>-info`      | hash |
//! | Room members  | `room-<group>-<room>-list`      | set  |
//! | Group info    | `group-<group>-info`            | hash |
//! | Group users   | `group-<group>-users`           | set  |
//! | Group rooms   | `group-<group>-rooms`           | set  |
//!
//! Existing stores depend on these strings byte for byte.

pub fn user_key(user_type: &str, login_name: &str, id: &str) -> String {
    format!("user-{user_type}-{login_name}-{id}")
}

pub fn user_rooms_key(user_type: &str, id: &str) -> String {
    format!("user-{user_type}-{id}-rooms")
}

pub fn user_groups_key(user_type: &str, id: &str) -> String {
    format!("user-{user_type}-{id}-groups")
}

/// Pattern locating a user record from its id alone
pub fn user_search_pattern(id: &str) -> String {
    format!("user-*-*-{id}")
}

pub fn room_info_key(group: &str, room: &str) -> String {
    format!("room-{group}-{room}-info")
}

pub fn room_list_key(group: &str, room: &str) -> String {
    format!("room-{group}-{room}-list")
}

pub fn group_info_key(group: &str) -> String {
    format!("group-{group}-info")
}

pub fn group_users_key(group: &str) -> String {
    format!("group-{group}-users")
}

pub fn group_rooms_key(group: &str) -> String {
    format!("group-{group}-rooms")
}
