// Key-value cache for client snapshots (Redis, or process-local when disabled)

use async_trait::async_trait;

use crate::types::AppResult;

pub mod memory;
pub mod redis_cache;

pub use memory::*;
pub use redis_cache::*;

/// String-keyed cache used to shortcut store reads.
#[async_trait]
pub trait ClientCache: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    async fn ping(&self) -> AppResult<()>;

    /// Short name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
