//! Field encoding of entities stored as hashes.
//!
//! The store only holds strings; booleans are `"true"` / `"false"` and
//! anything else reads as `false`. Missing string fields read as empty.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{ClientId, Group, Room, StoreError, User};

pub fn encode_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

pub fn decode_bool(value: Option<&String>) -> bool {
    value.is_some_and(|v| v == "true")
}

fn field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

pub fn user_fields(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("id", user.id.to_string()),
        ("type", user.user_type.clone()),
        ("username", user.username.clone()),
        ("loginname", user.login_name.clone()),
        ("email", user.email.clone()),
        ("password", user.password.clone()),
        ("salt", user.salt.clone()),
        ("connected", encode_bool(user.connected)),
    ]
}

/// Decode a user hash read from `key`. Rooms and groups start empty; they
/// live in their own sets.
pub fn decode_user(key: &str, fields: &HashMap<String, String>) -> Result<User, StoreError> {
    let raw_id = field(fields, "id");
    let id: ClientId = raw_id.parse().map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
        reason: format!("invalid user id '{raw_id}'"),
    })?;

    Ok(User {
        id,
        user_type: field(fields, "type"),
        username: field(fields, "username"),
        login_name: field(fields, "loginname"),
        email: field(fields, "email"),
        password: field(fields, "password"),
        salt: field(fields, "salt"),
        connected: decode_bool(fields.get("connected")),
        rooms: BTreeSet::new(),
        groups: BTreeSet::new(),
    })
}

pub fn room_fields(room: &Room) -> Vec<(&'static str, String)> {
    vec![
        ("title", room.title.clone()),
        ("group", room.group.clone()),
        ("private", encode_bool(room.private)),
    ]
}

/// Decode a room info hash. Members start empty.
pub fn decode_room(fields: &HashMap<String, String>) -> Room {
    Room {
        title: field(fields, "title"),
        group: field(fields, "group"),
        private: decode_bool(fields.get("private")),
        members: BTreeSet::new(),
    }
}

pub fn group_fields(group: &Group) -> Vec<(&'static str, String)> {
    vec![("title", group.title.clone())]
}

/// Member ids of a stored set, skipping empty and unparseable entries
pub fn decode_member_ids(key: &str, members: &BTreeSet<String>) -> BTreeSet<ClientId> {
    members
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| match m.parse::<ClientId>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Skipping member of '{}': {}", key, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fields_round_trip() {
        // テスト項目: ユーザーのスカラーフィールドが同じユーザーにデコードされる
        // given (前提条件):
        let mut user = User::guest(ClientId::generate());
        user.email = "alice@example.com".to_string();
        user.connected = false;

        // when (操作):
        let fields: HashMap<String, String> = user_fields(&user)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let decoded = decode_user("user-guest-x-y", &fields).unwrap();

        // then (期待する結果):
        assert_eq!(decoded, user);
        assert_eq!(fields.get("connected").map(String::as_str), Some("false"));
    }

    #[test]
    fn test_decode_user_rejects_bad_id() {
        // テスト項目: ID が UUID でないレコードは破損扱いになる
        // given (前提条件):
        let fields = HashMap::from([("id".to_string(), "nope".to_string())]);

        // when (操作):
        let result = decode_user("user-guest-x-nope", &fields);

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_decode_bool_only_accepts_true() {
        // テスト項目: "true" 以外はすべて false になる
        // given (前提条件):
        let values = [Some("true".to_string()), Some("yes".to_string()), None];

        // when (操作):
        let decoded: Vec<bool> = values.iter().map(|v| decode_bool(v.as_ref())).collect();

        // then (期待する結果):
        assert_eq!(decoded, vec![true, false, false]);
    }

    #[test]
    fn test_decode_member_ids_skips_junk() {
        // テスト項目: 空の要素と不正な要素は除外される
        // given (前提条件):
        let id = ClientId::generate();
        let members = BTreeSet::from([String::new(), "junk".to_string(), id.to_string()]);

        // when (操作):
        let ids = decode_member_ids("room-default-lobby-list", &members);

        // then (期待する結果):
        assert_eq!(ids, BTreeSet::from([id]));
    }
}
