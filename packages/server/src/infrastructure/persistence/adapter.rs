//! Persistence adapter.
//!
//! See [`crate::infrastructure::store::keys`] for the key layout. Reads
//! resolve the entity graph breadth first (group → rooms → users) and fetch
//! each user at most once per read, however many rooms it appears in.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::domain::{
    ClientId, EntityStore, Group, KeyValueStore, ResolvedGroup, ResolvedRoom, Room, StoreError,
    User,
};
use crate::infrastructure::store::keys;

use super::{
    codec,
    health::PersistenceHealth,
    worker::{SyncScheduler, SyncWorker},
};

#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
    syncs: SyncScheduler,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>, syncs: SyncScheduler) -> Self {
        Self { store, syncs }
    }

    /// Build an adapter together with its own [`SyncWorker`]
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        sync_capacity: usize,
        health: Arc<PersistenceHealth>,
    ) -> (Self, JoinHandle<()>) {
        let (syncs, handle) = SyncWorker::spawn(store.clone(), sync_capacity, health);
        (Self::new(store, syncs), handle)
    }

    /// Wait until every reconciliation scheduled so far has been applied
    pub async fn flush(&self) {
        self.syncs.flush().await;
    }

    /// Write the user's fields, then schedule its room and group sets
    pub async fn write_user(&self, user: &User) -> Result<(), StoreError> {
        let id = user.id.to_string();
        self.store
            .hset_all(
                &keys::user_key(&user.user_type, &user.login_name, &id),
                &codec::user_fields(user),
            )
            .await?;

        self.syncs.schedule(
            keys::user_rooms_key(&user.user_type, &id),
            user.rooms.clone(),
        );
        self.syncs.schedule(
            keys::user_groups_key(&user.user_type, &id),
            user.groups.clone(),
        );
        Ok(())
    }

    /// Write the room's info, then schedule its member set
    pub async fn write_room(&self, room: &Room) -> Result<(), StoreError> {
        self.store
            .hset_all(
                &keys::room_info_key(&room.group, &room.title),
                &codec::room_fields(room),
            )
            .await?;

        self.syncs.schedule(
            keys::room_list_key(&room.group, &room.title),
            room.members.iter().map(ToString::to_string).collect(),
        );
        Ok(())
    }

    /// Write the group's info, then schedule its room and user sets
    pub async fn write_group(&self, group: &Group) -> Result<(), StoreError> {
        self.store
            .hset_all(
                &keys::group_info_key(&group.title),
                &codec::group_fields(group),
            )
            .await?;

        self.syncs
            .schedule(keys::group_rooms_key(&group.title), group.rooms.clone());
        self.syncs.schedule(
            keys::group_users_key(&group.title),
            group.users.iter().map(ToString::to_string).collect(),
        );
        Ok(())
    }

    /// Load a user by id alone.
    ///
    /// The record key embeds the type and login name, so it is located by
    /// pattern first. Returns `Ok(None)` when no record matches.
    pub async fn get_user(&self, id: &ClientId) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        let matches = self.store.keys(&keys::user_search_pattern(&id)).await?;
        let Some(key) = matches.first() else {
            return Ok(None);
        };
        if matches.len() > 1 {
            tracing::warn!("{} records match user '{}', using '{}'", matches.len(), id, key);
        }

        let fields = self.store.hgetall(key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        let mut user = codec::decode_user(key, &fields)?;

        let user_id = user.id.to_string();
        user.rooms = self
            .store
            .smembers(&keys::user_rooms_key(&user.user_type, &user_id))
            .await?;
        user.groups = self
            .store
            .smembers(&keys::user_groups_key(&user.user_type, &user_id))
            .await?;

        Ok(Some(user))
    }

    /// Load a room and resolve its members. Members without a user record
    /// are left out of `users`.
    pub async fn get_room(
        &self,
        group: &str,
        title: &str,
    ) -> Result<Option<ResolvedRoom>, StoreError> {
        let Some(room) = self.load_room(group, title).await? else {
            return Ok(None);
        };
        let users = self.resolve_users(room.members.iter().copied()).await?;
        Ok(Some(ResolvedRoom {
            users: pick(&users, &room.members),
            room,
        }))
    }

    /// Load a group with its rooms and users.
    ///
    /// Resolution runs level by level: the group's sets, then every room
    /// record, then every distinct user id referenced anywhere in the group.
    /// Rooms whose `group` field names another group are skipped.
    pub async fn get_group(&self, title: &str) -> Result<ResolvedGroup, StoreError> {
        let rooms_key = keys::group_rooms_key(title);
        let users_key = keys::group_users_key(title);
        let room_titles = self.store.smembers(&rooms_key).await?;
        let user_ids = codec::decode_member_ids(&users_key, &self.store.smembers(&users_key).await?);

        let mut rooms = Vec::new();
        for room_title in room_titles.iter().filter(|t| !t.is_empty()) {
            match self.load_room(title, room_title).await? {
                Some(room) if room.group == title => rooms.push(room),
                Some(room) => tracing::warn!(
                    "Room '{}' is listed in group '{}' but belongs to '{}'",
                    room.title,
                    title,
                    room.group
                ),
                None => tracing::warn!(
                    "Room '{}' is listed in group '{}' but has no record",
                    room_title,
                    title
                ),
            }
        }

        let referenced = user_ids
            .iter()
            .copied()
            .chain(rooms.iter().flat_map(|room| room.members.iter().copied()));
        let users = self.resolve_users(referenced).await?;

        let resolved_rooms = rooms
            .into_iter()
            .map(|room| {
                let room_users = pick(&users, &room.members);
                (
                    room.title.clone(),
                    ResolvedRoom {
                        room,
                        users: room_users,
                    },
                )
            })
            .collect();

        Ok(ResolvedGroup {
            group: Group {
                title: title.to_string(),
                rooms: room_titles.into_iter().filter(|t| !t.is_empty()).collect(),
                users: user_ids.clone(),
            },
            rooms: resolved_rooms,
            users: pick(&users, &user_ids),
        })
    }

    /// Remove the user's room set, group set and record.
    ///
    /// Rooms and groups that list the user keep doing so; membership sets are
    /// only corrected by the next write of those rooms and groups.
    pub async fn delete_user(&self, user: &User) -> Result<(), StoreError> {
        let id = user.id.to_string();
        self.store
            .del(&keys::user_groups_key(&user.user_type, &id))
            .await?;
        self.store
            .del(&keys::user_rooms_key(&user.user_type, &id))
            .await?;
        self.store
            .del(&keys::user_key(&user.user_type, &user.login_name, &id))
            .await?;
        Ok(())
    }

    async fn load_room(&self, group: &str, title: &str) -> Result<Option<Room>, StoreError> {
        let fields = self.store.hgetall(&keys::room_info_key(group, title)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        let mut room = codec::decode_room(&fields);
        let list_key = keys::room_list_key(group, title);
        room.members = codec::decode_member_ids(&list_key, &self.store.smembers(&list_key).await?);
        Ok(Some(room))
    }

    /// Fetch every distinct id once
    async fn resolve_users(
        &self,
        ids: impl Iterator<Item = ClientId>,
    ) -> Result<BTreeMap<ClientId, User>, StoreError> {
        let seen: BTreeSet<ClientId> = ids.collect();
        let mut users = BTreeMap::new();
        for id in seen {
            match self.get_user(&id).await? {
                Some(user) => {
                    users.insert(id, user);
                }
                None => tracing::warn!("Member '{}' has no user record", id),
            }
        }
        Ok(users)
    }
}

#[async_trait]
impl EntityStore for PersistenceAdapter {
    async fn get_user(&self, id: &ClientId) -> Result<Option<User>, StoreError> {
        PersistenceAdapter::get_user(self, id).await
    }

    async fn get_room(
        &self,
        group: &str,
        title: &str,
    ) -> Result<Option<ResolvedRoom>, StoreError> {
        PersistenceAdapter::get_room(self, group, title).await
    }

    async fn get_group(&self, title: &str) -> Result<ResolvedGroup, StoreError> {
        PersistenceAdapter::get_group(self, title).await
    }

    async fn delete_user(&self, user: &User) -> Result<(), StoreError> {
        PersistenceAdapter::delete_user(self, user).await
    }
}

fn pick(users: &BTreeMap<ClientId, User>, ids: &BTreeSet<ClientId>) -> BTreeMap<ClientId, User> {
    ids.iter()
        .filter_map(|id| users.get(id).map(|user| (*id, user.clone())))
        .collect()
}
