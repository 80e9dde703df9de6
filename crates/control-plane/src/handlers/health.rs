//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "ok" or "unhealthy"
    pub status: String,
}

/// Detailed health check response for the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    pub status: String,

    pub server_name: String,

    /// Execution store backend ("memory" or "postgres")
    pub storage: String,

    /// "connected" or "disconnected"
    pub storage_status: String,

    pub uptime_seconds: u64,

    pub version: String,
}

/// Basic liveness check.
///
/// `GET /health`
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Detailed health check including the execution store.
///
/// `GET /api/health`
///
/// Returns `503 Service Unavailable` when the store is unreachable.
pub async fn api_health(State(state): State<AppState>) -> (StatusCode, Json<ApiHealthResponse>) {
    let storage_healthy = state.repository.health_check().await;

    let (status, status_code) = if storage_healthy {
        ("ok", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ApiHealthResponse {
        status: status.to_string(),
        server_name: state.config.server_name.clone(),
        storage: state.repository.backend().to_string(),
        storage_status: if storage_healthy {
            "connected".to_string()
        } else {
            "disconnected".to_string()
        },
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}
