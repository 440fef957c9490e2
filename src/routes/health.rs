use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Healthy as long as the database answers; cache state is informational.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.clients.ping_store().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "unavailable".to_string()
        }
    };

    let cache = match state.clients.ping_cache().await {
        Ok(()) => state.clients.cache_backend().to_string(),
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            "unavailable".to_string()
        }
    };

    let healthy = database == "connected";
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
        cache,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
