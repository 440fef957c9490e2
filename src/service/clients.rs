//! Client resource handler
//!
//! Implements create / get / update / soft-delete over the record store with
//! a cache-aside discipline:
//! - reads try the cache first and populate it on a store hit
//! - writes go to the store, then overwrite or evict the cached snapshot
//!
//! Cache failures never fail a request. There is no per-slug locking, so
//! concurrent writers to one slug can leave either snapshot in the cache.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::cache::ClientCache;
use crate::db::ClientStore;
use crate::models::{Client, ClientPatch, LogoUpload, NewClient, MAX_CLIENT_LOGO_LEN};
use crate::storage::{self, BlobStore};
use crate::types::{AppError, AppResult};

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn ClientStore>,
    cache: Arc<dyn ClientCache>,
    blobs: Arc<dyn BlobStore>,
}

impl ClientService {
    pub fn new(
        store: Arc<dyn ClientStore>,
        cache: Arc<dyn ClientCache>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self { store, cache, blobs }
    }

    /// Create a client, uploading its logo first when one is supplied.
    ///
    /// A failed upload aborts before anything is written to the store. The
    /// logo URL is checked against the column width before uploading.
    pub async fn create(&self, mut input: NewClient, logo: Option<LogoUpload>) -> AppResult<Client> {
        input.validate()?;

        if let Some(logo) = logo {
            let key = storage::object_key(&logo.filename);
            let expected_url = self.blobs.public_url(&key);
            if expected_url.chars().count() > MAX_CLIENT_LOGO_LEN {
                return Err(AppError::InvalidInput(format!(
                    "client_logo: URL would exceed {} characters",
                    MAX_CLIENT_LOGO_LEN
                )));
            }

            let content_type = logo
                .content_type
                .filter(|ct| !ct.is_empty() && ct.as_str() != "application/octet-stream")
                .unwrap_or_else(|| storage::guess_content_type(&logo.filename));

            let url = self
                .blobs
                .upload(&key, logo.data, &content_type)
                .await
                .map_err(|e| match e {
                    AppError::Upload(_) => e,
                    other => AppError::Upload(other.to_string()),
                })?;

            info!(slug = %input.slug, key = %key, "Uploaded client logo");
            input.client_logo = url;
        }

        let client = self.store.insert(&input).await?;
        info!(id = client.id, slug = %client.slug, "Client created");

        self.cache_put(&client).await;
        Ok(client)
    }

    /// Fetch an active client, served from the cache when possible.
    ///
    /// A cached snapshot is returned as-is: an entry that outlived a
    /// soft-delete is still served until it is evicted.
    pub async fn get(&self, slug: &str) -> AppResult<Client> {
        if let Some(client) = self.cache_get(slug).await {
            debug!(slug, "Cache hit");
            return Ok(client);
        }
        debug!(slug, "Cache miss");

        let client = self.find_active(slug).await?;
        self.cache_put(&client).await;
        Ok(client)
    }

    /// Apply a JSON partial update to the active client at `slug`.
    ///
    /// The slug is resolved before the body is parsed, so an unknown slug is
    /// reported as not found whatever the body holds.
    pub async fn update(&self, slug: &str, body: &[u8]) -> AppResult<Client> {
        let mut client = self.find_active(slug).await?;

        let patch: ClientPatch = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        patch.validate()?;

        // Evict before writing: a concurrent reader sees a miss, not stale data
        self.cache_evict(slug).await;

        patch.apply_to(&mut client);
        let updated = self
            .store
            .update(&client)
            .await?
            .ok_or_else(|| AppError::NotFound(slug.to_string()))?;
        info!(id = updated.id, slug = %updated.slug, "Client updated");

        // Keyed by the stored slug, which the patch may have changed
        self.cache_put(&updated).await;
        Ok(updated)
    }

    /// Soft-delete the active client at `slug` and evict its snapshot.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let client = self.find_active(slug).await?;

        if !self.store.soft_delete(client.id, Utc::now()).await? {
            return Err(AppError::NotFound(slug.to_string()));
        }
        info!(id = client.id, slug, "Client soft-deleted");

        self.cache_evict(slug).await;
        Ok(())
    }

    pub async fn ping_store(&self) -> AppResult<()> {
        self.store.ping().await
    }

    pub async fn ping_cache(&self) -> AppResult<()> {
        self.cache.ping().await
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    async fn find_active(&self, slug: &str) -> AppResult<Client> {
        self.store
            .find_active_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(slug.to_string()))
    }

    async fn cache_get(&self, slug: &str) -> Option<Client> {
        let raw = match self.cache.get(slug).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(slug, error = %e, "Cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(slug, error = %e, "Discarding undecodable cache entry");
                self.cache_evict(slug).await;
                None
            }
        }
    }

    async fn cache_put(&self, client: &Client) {
        let snapshot = match serde_json::to_string(client) {
            Ok(s) => s,
            Err(e) => {
                warn!(slug = %client.slug, error = %e, "Failed to serialize client for cache");
                return;
            }
        };

        if let Err(e) = self.cache.set(&client.slug, &snapshot).await {
            warn!(slug = %client.slug, error = %e, "Cache write failed");
        }
    }

    async fn cache_evict(&self, slug: &str) {
        if let Err(e) = self.cache.delete(slug).await {
            warn!(slug, error = %e, "Cache eviction failed");
        }
    }
}
