//! Shared fakes and request helpers for the integration tests.
//!
//! The record store and blob store are replaced with in-memory fakes so the
//! full router can be exercised without Postgres, Redis or S3.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, Response};
use axum::Router;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use client_registry::cache::{ClientCache, InMemoryCache};
use client_registry::config::ServerConfig;
use client_registry::db::{ClientStore, PgClientStore};
use client_registry::models::{AppState, Client, Lifecycle, NewClient};
use client_registry::storage::{self, BlobStore};
use client_registry::types::{AppError, AppResult};
use client_registry::ClientService;

pub const BOUNDARY: &str = "X-CLIENT-REGISTRY-BOUNDARY";

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Client>>,
}

impl MemoryStore {
    /// Every row, soft-deleted ones included.
    pub fn rows(&self) -> Vec<Client> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert(&self, input: &NewClient) -> AppResult<Client> {
        let mut rows = self.rows.lock().unwrap();
        // Like the unique index, deleted rows still hold their slug
        if rows.iter().any(|c| c.slug == input.slug) {
            return Err(AppError::Internal(format!(
                "duplicate key value violates unique constraint \"uq_clients_slug\" ({})",
                input.slug
            )));
        }

        let now = Utc::now();
        let client = Client {
            id: rows.len() as i64 + 1,
            name: input.name.clone(),
            slug: input.slug.clone(),
            is_project: input.is_project.clone(),
            self_capture: input.self_capture.clone(),
            client_prefix: input.client_prefix.clone(),
            client_logo: input.client_logo.clone(),
            address: input.address.clone(),
            phone_number: input.phone_number.clone(),
            city: input.city.clone(),
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        };
        rows.push(client.clone());
        Ok(client)
    }

    async fn find_active_by_slug(&self, slug: &str) -> AppResult<Option<Client>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|c| c.slug == slug && c.lifecycle.is_active())
            .cloned())
    }

    async fn update(&self, client: &Client) -> AppResult<Option<Client>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|c| c.id == client.id && c.lifecycle.is_active())
        else {
            return Ok(None);
        };

        *row = Client {
            id: row.id,
            created_at: row.created_at,
            updated_at: Utc::now(),
            lifecycle: row.lifecycle,
            ..client.clone()
        };
        Ok(Some(row.clone()))
    }

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|c| c.id == id && c.lifecycle.is_active())
        {
            Some(row) => {
                row.lifecycle = Lifecycle::Deleted { at };
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub data: Bytes,
}

pub const FAKE_BUCKET_URL: &str = "https://logos.s3.amazonaws.com";

pub struct FakeBlobStore {
    objects: Mutex<Vec<StoredObject>>,
    fail: AtomicBool,
    base_url: String,
}

impl Default for FakeBlobStore {
    fn default() -> Self {
        Self::with_base_url(FAKE_BUCKET_URL)
    }
}

impl FakeBlobStore {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            objects: Mutex::default(),
            fail: AtomicBool::new(false),
            base_url: base_url.to_string(),
        }
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    fn public_url(&self, key: &str) -> String {
        storage::public_url(&self.base_url, key)
    }

    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upload("bucket unreachable".to_string()));
        }
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(self.public_url(key))
    }
}

// ---------------------------------------------------------------------------
// Cache wrappers
// ---------------------------------------------------------------------------

/// In-memory cache that counts mutations.
#[derive(Default)]
pub struct RecordingCache {
    pub inner: InMemoryCache,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl RecordingCache {
    pub fn mutations(&self) -> usize {
        self.sets.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientCache for RecordingCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Cache whose every operation fails.
pub struct BrokenCache;

#[async_trait]
impl ClientCache for BrokenCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::Cache("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> AppResult<()> {
        Err(AppError::Cache("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::Cache("connection refused".to_string()))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::Cache("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

// ---------------------------------------------------------------------------
// Test context
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<RecordingCache>,
    pub blobs: Arc<FakeBlobStore>,
    pub service: ClientService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_blobs(FakeBlobStore::default())
    }

    pub fn with_blobs(blobs: FakeBlobStore) -> Self {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(RecordingCache::default());
        let blobs = Arc::new(blobs);
        let service = ClientService::new(store.clone(), cache.clone(), blobs.clone());
        Self {
            store,
            cache,
            blobs,
            service,
        }
    }

    pub fn app(&self) -> Router {
        app_for(self.service.clone())
    }
}

/// Router over a real Postgres store, with in-memory cache and blob fakes.
pub fn pg_app(pool: PgPool) -> Router {
    app_for(ClientService::new(
        Arc::new(PgClientStore::new(pool)),
        Arc::new(InMemoryCache::new()),
        Arc::new(FakeBlobStore::default()),
    ))
}

fn app_for(clients: ClientService) -> Router {
    client_registry::create_router(AppState { clients }, &test_server_config())
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        host: "127.0.0.1".to_string(),
        cors_allowed_origins: vec!["*".to_string()],
        max_upload_bytes: 1024 * 1024,
    }
}

pub fn new_client_json(slug: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Acme Corp",
        "slug": slug,
        "is_project": "1",
        "self_capture": "0",
        "client_prefix": "ACM",
        "address": "1 Main St",
        "phone_number": "555-0100",
        "city": "Springfield"
    })
}

pub fn new_client(slug: &str) -> NewClient {
    serde_json::from_value(new_client_json(slug)).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Build a multipart body from text fields and an optional
/// `(field, filename, content_type, bytes)` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}
