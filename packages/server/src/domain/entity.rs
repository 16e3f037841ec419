//! Durable entities mirrored into the key-value store.
//!
//! Connected clients themselves are transient and live only in the
//! connection registry; these are the records the persistence adapter reads
//! and writes.

use std::collections::{BTreeMap, BTreeSet};

use super::value_object::ClientId;

/// User type assigned to identities created for anonymous connections
pub const GUEST_USER_TYPE: &str = "guest";

/// Durable user identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ClientId,
    /// Namespace discriminator, part of the storage key
    pub user_type: String,
    pub username: String,
    pub login_name: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub connected: bool,
    /// Titles of joined rooms
    pub rooms: BTreeSet<String>,
    /// Titles of joined groups
    pub groups: BTreeSet<String>,
}

impl User {
    /// Identity for a connection that never authenticated.
    ///
    /// The id doubles as username and login name.
    pub fn guest(id: ClientId) -> Self {
        let name = id.to_string();
        Self {
            id,
            user_type: GUEST_USER_TYPE.to_string(),
            username: name.clone(),
            login_name: name,
            email: String::new(),
            password: String::new(),
            salt: String::new(),
            connected: true,
            rooms: BTreeSet::new(),
            groups: BTreeSet::new(),
        }
    }
}

/// Room record with its member ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub title: String,
    /// Title of the owning group
    pub group: String,
    pub private: bool,
    pub members: BTreeSet<ClientId>,
}

/// Group record with its room titles and user ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub title: String,
    pub rooms: BTreeSet<String>,
    pub users: BTreeSet<ClientId>,
}

/// A room read back from the store with every resolvable member loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoom {
    pub room: Room,
    pub users: BTreeMap<ClientId, User>,
}

/// A group read back from the store with its rooms and users loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    pub group: Group,
    pub rooms: BTreeMap<String, ResolvedRoom>,
    pub users: BTreeMap<ClientId, User>,
}
