use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ClientCache;
use crate::types::AppResult;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Process-local cache, used when Redis is disabled.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Option<Duration>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let guard = self.inner.read().await;
        guard.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl ClientCache for InMemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let guard = self.inner.read().await;
        Ok(guard
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
