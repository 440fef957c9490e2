use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use super::ClientCache;
use crate::config::CacheConfig;
use crate::types::{AppError, AppResult};

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

/// Redis-backed cache sharing one auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub async fn connect(config: &CacheConfig) -> anyhow::Result<Self> {
        let client = redis::Client::open(config.redis_url())?;
        let conn = ConnectionManager::new(client).await?;
        info!(addr = %config.addr, db = config.db, "Connected to Redis");

        Ok(Self {
            conn,
            ttl: config.ttl_secs.filter(|&secs| secs > 0).map(Duration::from_secs),
        })
    }
}

#[async_trait]
impl ClientCache for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        match self.ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
