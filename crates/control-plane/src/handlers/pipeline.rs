//! Pipeline execution API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::models::{Execution, ExecutionMetrics, PipelineConfiguration};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request to start a pipeline execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Integrated system (e.g., "hvac-v2"). Required.
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
}

/// Response for an accepted execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub message: String,
    pub execution_id: Uuid,
}

/// Start a pipeline execution.
///
/// POST /api/pipeline/execute
///
/// Returns `202 Accepted` as soon as the execution is stored. Progress is
/// read back through the status endpoint.
pub async fn execute(
    State(state): State<AppState>,
    request: Result<Json<ExecuteRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ExecuteResponse>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let system = request
        .system
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("system is required".to_string()))?;

    let execution_id = state
        .coordinator
        .start(system, request.object_type.as_deref())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ExecuteResponse {
            success: true,
            message: format!("Pipeline execution started for {}", system),
            execution_id,
        }),
    ))
}

/// Get the full execution record.
///
/// GET /api/pipeline/status/{id}
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Execution>> {
    let execution_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound(format!("Execution not found: {}", id)))?;

    debug!(execution_id = %execution_id, "Status request");
    let execution = state.repository.get(execution_id).await?;
    Ok(Json(execution))
}

/// List all executions, oldest first.
///
/// GET /api/pipeline/executions
pub async fn executions(State(state): State<AppState>) -> AppResult<Json<Vec<Execution>>> {
    Ok(Json(state.repository.list().await?))
}

/// Aggregate execution statistics.
///
/// GET /api/pipeline/metrics
pub async fn metrics(State(state): State<AppState>) -> AppResult<Json<ExecutionMetrics>> {
    Ok(Json(state.repository.get_metrics().await?))
}

/// Stored configuration entries for a system.
///
/// GET /api/pipeline/configurations/{system}
pub async fn configurations(
    State(state): State<AppState>,
    Path(system): Path<String>,
) -> AppResult<Json<Vec<PipelineConfiguration>>> {
    Ok(Json(state.repository.get_configurations(&system).await?))
}
