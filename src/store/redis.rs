use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::Store;

/// Redis implementation of the Store trait
///
/// Holds one multiplexed connection behind a mutex; every primitive acquires
/// it for the duration of a single command. The mutex only serializes calls
/// within this process; cross-process safety comes from each command being
/// atomic on the server.
pub struct RedisStore {
    /// Redis client
    client: Client,

    /// Shared connection handle
    conn: Arc<Mutex<MultiplexedConnection>>,
}

impl RedisStore {
    /// Connect to the Redis server at the given URL
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .context(format!("Failed to connect to Redis at {}", redis_url))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis connection")?;

        debug!("Connected to Redis at {}", redis_url);

        Ok(Self {
            client,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a fresh connection from the same client
    ///
    /// Useful when a caller wants its own handle instead of sharing the
    /// serialized one, e.g. one per worker.
    pub async fn reconnect(&self) -> Result<Self> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis connection")?;

        Ok(Self {
            client: self.client.clone(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn list_push(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        redis::cmd("RPUSH")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to push to Redis list")?;

        Ok(())
    }

    async fn list_pop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.lock().await;

        redis::cmd("LPOP")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .context("Failed to pop from Redis list")
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.lock().await;

        redis::cmd("LLEN")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .context("Failed to get Redis list length")
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;

        let added: i64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut *conn)
            .await
            .context("Failed to add member to Redis set")?;

        Ok(added > 0)
    }

    async fn set_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.lock().await;

        redis::cmd("SCARD")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .context("Failed to get Redis set size")
    }

    async fn zset_add(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let mut conn = self.conn.lock().await;

        redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(member)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to add member to Redis sorted set")?;

        Ok(())
    }

    async fn zset_pop_max(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.lock().await;

        // ZPOPMAX replies with a flat [member, score] array; a single
        // server-side command, so concurrent pollers never see the same member.
        let popped: Vec<String> = redis::cmd("ZPOPMAX")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .context("Failed to pop from Redis sorted set")?;

        Ok(popped.into_iter().next())
    }

    async fn zset_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.lock().await;

        redis::cmd("ZCARD")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .context("Failed to get Redis sorted set size")
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to set Redis hash field")?;

        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.lock().await;

        redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut *conn)
            .await
            .context("Failed to get Redis hash field")
    }

    async fn hash_del(&self, key: &str, field: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to delete Redis hash field")?;

        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to delete Redis key")?;

        Ok(())
    }
}
