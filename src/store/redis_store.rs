use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::AsyncCommands;

use super::{KvStore, StoreError};

/// [`KvStore`] backed by the shared Redis pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        if ttl_secs == 0 {
            conn.set::<_, _, ()>(key, value).await?;
        } else {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        }
        Ok(())
    }

    async fn swap(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        let previous = redis::cmd("GETSET")
            .arg(key)
            .arg(value)
            .query_async::<Option<String>>(&mut conn)
            .await?;
        Ok(previous)
    }
}
