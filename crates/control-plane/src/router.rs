//! HTTP route table.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes: Router<AppState> = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health));

    let pipeline_routes: Router<AppState> = Router::new()
        .route("/api/pipeline/execute", post(handlers::pipeline::execute))
        .route("/api/pipeline/status/{id}", get(handlers::pipeline::status))
        .route("/api/pipeline/executions", get(handlers::pipeline::executions))
        .route("/api/pipeline/metrics", get(handlers::pipeline::metrics))
        .route(
            "/api/pipeline/configurations/{system}",
            get(handlers::pipeline::configurations),
        );

    let validation_routes: Router<AppState> = Router::new()
        .route(
            "/api/pipeline/validate-schema/{system}",
            post(handlers::validation::validate_schema),
        )
        .route(
            "/api/pipeline/validate-symbol/{symbol}",
            post(handlers::validation::validate_symbol),
        )
        .route(
            "/api/pipeline/validate-behavior/{system}",
            post(handlers::validation::validate_behavior),
        );

    Router::new()
        .merge(health_routes)
        .merge(pipeline_routes)
        .merge(validation_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pipeline_bridge::{BridgeClient, BridgeConfig, ProcessBridge};
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::catalog::PipelineCatalog;
    use crate::config::AppConfig;
    use crate::db::models::{ExecutionStatus, PipelineConfiguration};
    use crate::db::{ExecutionRepository, InMemoryExecutionRepository};
    use crate::engine::{PipelineCoordinator, StepExecutors};
    use crate::services::ValidationService;
    use crate::testing::{wait_for_terminal, ScriptedBridge};

    fn state_with(bridge: Arc<dyn BridgeClient>) -> AppState {
        let repository: Arc<dyn ExecutionRepository> =
            Arc::new(InMemoryExecutionRepository::with_configurations(vec![
                PipelineConfiguration::new("hvac-v2", None, "registry-mapping", json!({"prefix": "hvac"})),
            ]));
        let coordinator = PipelineCoordinator::new(
            repository,
            StepExecutors::with_bridge(bridge.clone()),
            Arc::new(PipelineCatalog::builtin()),
        );
        AppState::new(coordinator, ValidationService::new(bridge), AppConfig::default())
    }

    fn state() -> AppState {
        state_with(Arc::new(ScriptedBridge::new()))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_routes() {
        let router = build_router(state());

        let (status, body) = send(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&router, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storage"], "memory");
        assert_eq!(body["storage_status"], "connected");
    }

    #[tokio::test]
    async fn test_execute_requires_system() {
        let state = state();
        let router = build_router(state.clone());

        let (status, body) = send(&router, "POST", "/api/pipeline/execute", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "system is required");
        assert_eq!(body["status"], 400);

        let (status, _) = send(
            &router,
            "POST",
            "/api/pipeline/execute",
            Some(json!({"system": "  ", "object_type": "air-handler"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_body() {
        let router = build_router(state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/pipeline/execute")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_execute_then_poll_status() {
        let state = state();
        let router = build_router(state.clone());

        let (status, body) = send(
            &router,
            "POST",
            "/api/pipeline/execute",
            Some(json!({"system": "hvac-v2"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["success"], true);
        let id: uuid::Uuid = serde_json::from_value(body["execution_id"].clone()).unwrap();

        let finished = wait_for_terminal(&state.repository, id).await;
        assert_eq!(finished.status, ExecutionStatus::Completed);

        let (status, body) = send(&router, "GET", &format!("/api/pipeline/status/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["steps"].as_array().map(Vec::len), Some(4));
        assert_eq!(body["steps"][0]["name"], "validate-schema");

        let (_, body) = send(&router, "GET", "/api/pipeline/executions", None).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, body) = send(&router, "GET", "/api/pipeline/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_executions"], 1);
        assert_eq!(body["completed"], 1);
    }

    #[tokio::test]
    async fn test_status_unknown_id() {
        let router = build_router(state());

        let (status, body) = send(&router, "GET", "/api/pipeline/status/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let unknown = uuid::Uuid::new_v4();
        let (status, _) = send(&router, "GET", &format!("/api/pipeline/status/{}", unknown), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configurations_by_system() {
        let router = build_router(state());

        let (status, body) = send(&router, "GET", "/api/pipeline/configurations/hvac-v2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "registry-mapping");
        assert_eq!(body[0]["config"]["prefix"], "hvac");

        let (_, body) = send(&router, "GET", "/api/pipeline/configurations/lighting", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_validate_symbol_returns_bridge_result() {
        let router = build_router(state());

        let (status, body) = send(
            &router,
            "POST",
            "/api/pipeline/validate-symbol/AHU",
            Some(json!({"data": {"name": "Air Handling Unit"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["operation"], "validate-symbol");

        let (status, body) = send(
            &router,
            "POST",
            "/api/pipeline/validate-behavior/hvac-v2",
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "data is required");
    }

    #[tokio::test]
    async fn test_validate_accepts_null_data() {
        let bridge = Arc::new(ScriptedBridge::new());
        let router = build_router(state_with(bridge.clone()));

        let (status, body) = send(
            &router,
            "POST",
            "/api/pipeline/validate-behavior/hvac-v2",
            Some(json!({"data": null})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["operation"], "validate-behavior");
        assert_eq!(bridge.params()[0]["data"], "null");
    }

    #[tokio::test]
    async fn test_validate_schema_failure_surfaces_bridge_output() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("bridge.sh"),
            "echo \"schema invalid\" >&2\nexit 1\n",
        )
        .unwrap();
        let bridge = ProcessBridge::new(&BridgeConfig {
            interpreter: "sh".to_string(),
            root: dir.path().to_path_buf(),
            script: PathBuf::from("bridge.sh"),
            timeout_seconds: 5,
            fail_on_stderr: true,
        });
        let state = state_with(Arc::new(bridge));
        let router = build_router(state.clone());

        let (status, body) = send(
            &router,
            "POST",
            "/api/pipeline/validate-schema/hvac-v2",
            Some(json!({"data": {"fields": []}})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap_or_default().contains("schema invalid"));
        assert!(state.repository.list().await.unwrap().is_empty());
    }
}
