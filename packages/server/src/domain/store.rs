//! Store ports.
//!
//! - [`KeyValueStore`]: the raw store, a black box holding hashes and sets
//!   behind a request/response protocol
//! - [`EntityStore`]: the read path over users, rooms and groups persisted
//!   in it

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use super::{
    entity::{ResolvedGroup, ResolvedRoom, User},
    error::StoreError,
    value_object::ClientId,
};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Set several hash fields at once
    async fn hset_all(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;

    /// All fields of a hash; empty when the key does not exist
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Members of a set; empty when the key does not exist
    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, StoreError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError>;

    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Keys matching a glob pattern (`*` and `?`)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    async fn del(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// `Ok(None)` when no record exists for `id`
    async fn get_user(&self, id: &ClientId) -> Result<Option<User>, StoreError>;

    async fn get_room(&self, group: &str, title: &str)
    -> Result<Option<ResolvedRoom>, StoreError>;

    async fn get_group(&self, title: &str) -> Result<ResolvedGroup, StoreError>;

    async fn delete_user(&self, user: &User) -> Result<(), StoreError>;
}
