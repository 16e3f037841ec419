//! Bulk-load commands.
//!
//! Produces the same writes as [`super::PersistenceAdapter`] as plain
//! command argument lists, for feeding a store through its mass-insert
//! pipe after RESP encoding.

use crate::domain::{Group, Room, User};
use crate::infrastructure::store::keys;

use super::codec;

pub type Command = Vec<String>;

fn hset(key: String, fields: Vec<(&'static str, String)>) -> Command {
    let mut command = vec!["HSET".to_string(), key];
    for (name, value) in fields {
        command.push(name.to_string());
        command.push(value);
    }
    command
}

fn sadd<I>(key: String, members: I) -> Option<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut command = vec!["SADD".to_string(), key];
    command.extend(members.into_iter().filter(|m| !m.is_empty()));
    (command.len() > 2).then_some(command)
}

pub fn user_commands(user: &User) -> Vec<Command> {
    let id = user.id.to_string();
    let mut commands = vec![hset(
        keys::user_key(&user.user_type, &user.login_name, &id),
        codec::user_fields(user),
    )];
    commands.extend(sadd(
        keys::user_rooms_key(&user.user_type, &id),
        user.rooms.iter().cloned(),
    ));
    commands.extend(sadd(
        keys::user_groups_key(&user.user_type, &id),
        user.groups.iter().cloned(),
    ));
    commands
}

pub fn room_commands(room: &Room) -> Vec<Command> {
    let mut commands = vec![hset(
        keys::room_info_key(&room.group, &room.title),
        codec::room_fields(room),
    )];
    commands.extend(sadd(
        keys::room_list_key(&room.group, &room.title),
        room.members.iter().map(ToString::to_string),
    ));
    commands
}

pub fn group_commands(group: &Group) -> Vec<Command> {
    let mut commands = vec![hset(
        keys::group_info_key(&group.title),
        codec::group_fields(group),
    )];
    commands.extend(sadd(
        keys::group_rooms_key(&group.title),
        group.rooms.iter().cloned(),
    ));
    commands.extend(sadd(
        keys::group_users_key(&group.title),
        group.users.iter().map(ToString::to_string),
    ));
    commands
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::ClientId;

    #[test]
    fn test_user_commands() {
        // テスト項目: ユーザーが HSET 1 件と、空でないセットごとの SADD になる
        // given (前提条件):
        let mut user = User::guest(ClientId::generate());
        user.rooms.insert("lobby".to_string());
        let id = user.id.to_string();

        // when (操作):
        let commands = user_commands(&user);

        // then (期待する結果):
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0][0], "HSET");
        assert_eq!(commands[0][1], format!("user-guest-{id}-{id}"));
        assert_eq!(
            commands[1],
            vec![
                "SADD".to_string(),
                format!("user-guest-{id}-rooms"),
                "lobby".to_string()
            ]
        );
    }

    #[test]
    fn test_group_commands() {
        // テスト項目: グループの info、ルーム、ユーザーがすべて書き込まれる
        // given (前提条件):
        let id = ClientId::generate();
        let group = Group {
            title: "default".to_string(),
            rooms: BTreeSet::from(["attic".to_string(), "lobby".to_string()]),
            users: BTreeSet::from([id]),
        };

        // when (操作):
        let commands = group_commands(&group);

        // then (期待する結果):
        assert_eq!(
            commands,
            vec![
                vec!["HSET", "group-default-info", "title", "default"]
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>(),
                vec!["SADD", "group-default-rooms", "attic", "lobby"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                vec!["SADD".to_string(), "group-default-users".to_string(), id.to_string()],
            ]
        );
    }

    #[test]
    fn test_room_without_members() {
        // テスト項目: メンバーが空のときは SADD を生成しない
        // given (前提条件):
        let room = Room {
            title: "lobby".to_string(),
            group: "default".to_string(),
            private: true,
            members: BTreeSet::new(),
        };

        // when (操作):
        let commands = room_commands(&room);

        // then (期待する結果):
        assert_eq!(commands.len(), 1);
        assert!(commands[0].ends_with(&["private".to_string(), "true".to_string()]));
    }
}
