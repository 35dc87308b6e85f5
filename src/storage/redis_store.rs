//! Redis storage backend.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::Result;
use crate::models::StoreConfig;
use crate::storage::KeyValueStore;

/// Redis-backed key/value store.
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// call works on its own handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect using the configured host/port/db (or URL override).
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url().as_str())?;
        let conn = ConnectionManager::new(client).await?;
        log::info!(
            "Connected to store at {}:{} (db {})",
            config.host,
            config.port,
            config.db
        );
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await?;
        Ok(added > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.srem(key, member).await?;
        Ok(removed > 0)
    }

    async fn set_is_member(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let is_member: bool = conn.sismember(key, member).await?;
        Ok(is_member)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }
}
