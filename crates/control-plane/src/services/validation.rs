//! Standalone pre-flight validation.
//!
//! Each check is a single synchronous bridge call. Nothing here creates or
//! touches an execution record.

use pipeline_bridge::{BridgeClient, BridgeParams};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// The three pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Schema,
    Symbol,
    Behavior,
}

impl ValidationKind {
    /// Bridge operation name.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Schema => "validate-schema",
            Self::Symbol => "validate-symbol",
            Self::Behavior => "validate-behavior",
        }
    }

    /// Parameter carrying the validation target.
    pub fn target_key(&self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Schema | Self::Behavior => "system",
        }
    }
}

/// Runs pre-flight checks against the bridge.
#[derive(Clone)]
pub struct ValidationService {
    bridge: Arc<dyn BridgeClient>,
}

impl ValidationService {
    pub fn new(bridge: Arc<dyn BridgeClient>) -> Self {
        Self { bridge }
    }

    /// Invoke the bridge once and return its structured result.
    pub async fn validate(&self, kind: ValidationKind, target: &str, data: &Value) -> AppResult<Value> {
        let target = target.trim();
        if target.is_empty() {
            return Err(AppError::Validation(format!(
                "{} is required",
                kind.target_key()
            )));
        }

        let mut params = BridgeParams::new();
        params.insert(kind.target_key().to_string(), target.to_string());
        params.insert("data".to_string(), serde_json::to_string(data)?);

        debug!(operation = kind.operation(), target = %target, "Running validation");
        let output = self.bridge.invoke(kind.operation(), &params).await?;
        info!(
            operation = kind.operation(),
            target = %target,
            duration_ms = output.duration_ms,
            "Validation finished"
        );

        Ok(output.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;
    use serde_json::json;

    #[tokio::test]
    async fn test_validate_schema_passes_target_and_data() {
        let bridge = Arc::new(ScriptedBridge::new());
        let service = ValidationService::new(bridge.clone());

        let result = service
            .validate(ValidationKind::Schema, "hvac-v2", &json!({"fields": ["supply_temp"]}))
            .await
            .unwrap();

        assert_eq!(result["operation"], "validate-schema");
        let params = bridge.params();
        assert_eq!(params[0]["system"], "hvac-v2");
        assert_eq!(params[0]["data"], r#"{"fields":["supply_temp"]}"#);
    }

    #[tokio::test]
    async fn test_validate_symbol_uses_symbol_key() {
        let bridge = Arc::new(ScriptedBridge::new());
        let service = ValidationService::new(bridge.clone());

        service.validate(ValidationKind::Symbol, "AHU", &json!({})).await.unwrap();
        service
            .validate(ValidationKind::Behavior, "hvac-v2", &json!(null))
            .await
            .unwrap();

        assert_eq!(bridge.calls(), vec!["validate-symbol", "validate-behavior"]);
        let params = bridge.params();
        assert_eq!(params[0]["symbol"], "AHU");
        assert!(!params[0].contains_key("system"));
        assert_eq!(params[1]["data"], "null");
    }

    #[tokio::test]
    async fn test_bridge_failure_is_returned() {
        let bridge = Arc::new(ScriptedBridge::new().fail_on("validate-schema", "exit code 1: schema invalid"));
        let service = ValidationService::new(bridge);

        let err = service
            .validate(ValidationKind::Schema, "hvac-v2", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Bridge(_)));
        assert!(err.to_string().contains("schema invalid"));
    }

    #[tokio::test]
    async fn test_blank_target_rejected_before_bridge() {
        let bridge = Arc::new(ScriptedBridge::new());
        let service = ValidationService::new(bridge.clone());

        let err = service
            .validate(ValidationKind::Symbol, " ", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "symbol is required"));
        assert!(bridge.calls().is_empty());
    }
}
