pub mod memory;
pub mod redis;

// Re-export common types
pub use self::redis::RedisStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::cli::config::StoreSettings;

/// Shared key-value store primitives the scheduler composes
///
/// Each method maps to exactly one store command and is atomic on its own;
/// the scheduler never assumes atomicity across two calls. The handle is
/// passed explicitly into every component that needs it, never held as a
/// global.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Append a value to the tail of a list
    async fn list_push(&self, key: &str, value: &str) -> Result<()>;

    /// Pop the head of a list, if any
    async fn list_pop(&self, key: &str) -> Result<Option<String>>;

    /// Current length of a list (0 for a missing key)
    async fn list_len(&self, key: &str) -> Result<u64>;

    /// Add a member to a set; returns true iff it was not already present
    async fn set_add(&self, key: &str, member: &str) -> Result<bool>;

    /// Cardinality of a set (0 for a missing key)
    async fn set_len(&self, key: &str) -> Result<u64>;

    /// Add a member to a sorted set with the given score, replacing any
    /// previous score for that member
    async fn zset_add(&self, key: &str, member: &str, score: i64) -> Result<()>;

    /// Atomically remove and return the highest-scored member
    ///
    /// Ties between equal scores resolve to the lexicographically greatest
    /// member, matching Redis ZPOPMAX.
    async fn zset_pop_max(&self, key: &str) -> Result<Option<String>>;

    /// Cardinality of a sorted set (0 for a missing key)
    async fn zset_len(&self, key: &str) -> Result<u64>;

    /// Set a hash field to a value
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Read a hash field, if present
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Delete a hash field
    async fn hash_del(&self, key: &str, field: &str) -> Result<()>;

    /// Delete an entire key
    async fn del(&self, key: &str) -> Result<()>;
}

/// Factory for creating a Store implementation
pub struct StoreFactory;

impl StoreFactory {
    /// Create a new Store instance based on the settings
    pub async fn create(settings: &StoreSettings) -> Result<Arc<dyn Store>> {
        match settings.backend.as_str() {
            "redis" => {
                let store = RedisStore::new(&settings.redis_url).await?;
                Ok(Arc::new(store))
            }
            "memory" => Ok(Arc::new(MemoryStore::new())),
            _ => {
                anyhow::bail!("Unsupported store backend: {}", settings.backend);
            }
        }
    }
}
