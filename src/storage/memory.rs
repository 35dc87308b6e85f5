//! In-process storage backend.
//!
//! Holds everything in memory for tests and dry runs; state is lost on exit.
//! Production deployments should use `RedisStore`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::storage::KeyValueStore;

#[derive(Debug, Default)]
struct Inner {
    scalars: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
}

/// Memory-backed key/value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().await.scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .lock()
            .await
            .scalars
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get_mut(key)
            .is_some_and(|set| set.remove(member)))
    }

    async fn set_is_member(&self, key: &str, member: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.sets.get(key).is_some_and(|set| set.contains(member)))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
