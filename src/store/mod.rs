//! Key-value persistence shared across pipeline runs.
//!
//! Everything the pipeline remembers between invocations (the run lock, the
//! processed-match map and the cached API responses) lives behind [`KvStore`].
//! A `ttl_secs` of `0` means the value persists until it is overwritten.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub mod lock;
pub mod memory;
pub mod processed;
pub mod redis_store;

pub use lock::{RunLock, RunLockGuard};
pub use memory::MemoryStore;
pub use processed::{ProcessedMatches, ProcessedRecord};
pub use redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to get redis connection: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("invalid value under `{key}`: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Stores `value` without expiry and returns the previous value.
    ///
    /// The default implementation is a read followed by a write, so two
    /// callers can both observe the old value. Backends with a native atomic
    /// swap override it.
    async fn swap(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        let previous = self.get(key).await?;
        if previous.as_deref() != Some(value) {
            self.set(key, value, 0).await?;
        }
        Ok(previous)
    }
}

pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw, ttl_secs).await
}
