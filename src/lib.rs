// Client Registry - CRUD service for client records with cache-aside reads and S3 logo uploads

pub mod cache;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use service::ClientService;

pub fn create_router(state: AppState, server: &config::ServerConfig) -> axum::Router {
    routes::create_router(state, server)
}
