//! Standalone validation handlers.
//!
//! Each endpoint makes one bridge call and returns its result or error
//! directly. No execution is created.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::services::ValidationKind;
use crate::state::AppState;

/// Validation request body.
///
/// `data` must be present but may be any JSON value, `null` included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,
}

/// `Some` for any value the key carries, so `null` is kept apart from a missing key.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

async fn run(
    state: &AppState,
    kind: ValidationKind,
    target: &str,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let data = request
        .data
        .ok_or_else(|| AppError::Validation("data is required".to_string()))?;

    let result = state.validation.validate(kind, target, &data).await?;
    Ok(Json(result))
}

/// POST /api/pipeline/validate-schema/{system}
pub async fn validate_schema(
    State(state): State<AppState>,
    Path(system): Path<String>,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    run(&state, ValidationKind::Schema, &system, request).await
}

/// POST /api/pipeline/validate-symbol/{symbol}
pub async fn validate_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    run(&state, ValidationKind::Symbol, &symbol, request).await
}

/// POST /api/pipeline/validate-behavior/{system}
pub async fn validate_behavior(
    State(state): State<AppState>,
    Path(system): Path<String>,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    run(&state, ValidationKind::Behavior, &system, request).await
}
