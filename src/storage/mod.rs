//! Storage abstractions for watcher state.
//!
//! All persistent state lives in a key/value store as scalars and sets:
//!
//! ```text
//! {prefix}:USERS     set     subscriber chat ids
//! {prefix}:UPDATE    scalar  last processed page marker
//! {prefix}:MONITOR   set     fingerprints already notified, per category
//! {prefix}:CLOSE     set
//! {prefix}:CASUAL    set
//! ```
//!
//! Each operation is atomic at the store level; nothing spans keys.

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ExposureCategory;

// Re-export for convenience
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Minimal key/value store surface the watcher needs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a scalar, `None` if never set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a scalar.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Add a set member. Returns `true` if it was not already present.
    async fn set_add(&self, key: &str, member: &str) -> Result<bool>;

    /// Remove a set member. Returns `true` if it was present.
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool>;

    async fn set_is_member(&self, key: &str, member: &str) -> Result<bool>;

    /// Full membership, in no particular order.
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;
}

/// Key names derived from the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    prefix: String,
}

impl StoreKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn subscribers(&self) -> String {
        format!("{}:USERS", self.prefix)
    }

    pub fn marker(&self) -> String {
        format!("{}:UPDATE", self.prefix)
    }

    pub fn fingerprints(&self, category: ExposureCategory) -> String {
        format!("{}:{}", self.prefix, category.key_suffix())
    }
}
