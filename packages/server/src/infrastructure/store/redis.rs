//! Redis-backed key-value store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use redis::{AsyncCommands, RedisError, aio::ConnectionManager};

use crate::domain::{KeyValueStore, StoreError};

fn map_error(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

/// Store reached through a reconnecting Redis connection
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` and confirm the server answers a PING
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(map_error)?;
        let info = client.get_connection_info();
        if info.redis.password.is_none() {
            tracing::warn!("Insecure redis database is not recommended");
        }
        let addr = info.addr.to_string();

        let connection = ConnectionManager::new(client).await.map_err(map_error)?;
        let store = Self { connection };
        store.ping().await?;
        tracing::info!("Connected to redis at {}", addr);
        Ok(store)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn hset_all(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut con = self.connection.clone();
        let _: () = con.hset_multiple(key, fields).await.map_err(map_error)?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut con = self.connection.clone();
        con.hgetall(key).await.map_err(map_error)
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        let mut con = self.connection.clone();
        let members: Vec<String> = con.smembers(key).await.map_err(map_error)?;
        Ok(members.into_iter().collect())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.sadd(key, member).await.map_err(map_error)?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.srem(key, member).await.map_err(map_error)?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut con = self.connection.clone();
        con.keys(pattern).await.map_err(map_error)
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.del(key).await.map_err(map_error)?;
        Ok(())
    }
}
