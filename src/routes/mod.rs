//! API Routes
//!
//! - `POST   /clients`        - create a client (multipart with optional logo, JSON or form)
//! - `GET    /clients/{slug}` - fetch an active client
//! - `PUT    /clients/{slug}` - partial update
//! - `DELETE /clients/{slug}` - soft delete
//! - `GET    /health`         - database / cache status

pub mod clients;
pub mod health;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(clients::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_allowed_origins))
        .with_state(state)
}
