//! Bridge client capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::BridgeError;

/// Operation parameters. Ordered so the serialized form is stable.
pub type BridgeParams = BTreeMap<String, String>;

/// Structured result of a successful bridge operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeOutput {
    /// The object the bridge wrote to stdout.
    pub data: Map<String, Value>,

    /// Process wall time in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl BridgeOutput {
    /// Create an output from a decoded object.
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            duration_ms: 0,
        }
    }

    /// Set the execution duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Consume the output, returning the result object as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

/// Runs a named operation outside the orchestrator's own runtime.
///
/// Implementations must bound the lifetime of each call and never panic.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Invoke `operation` with `params`, returning its structured result.
    async fn invoke(
        &self,
        operation: &str,
        params: &BridgeParams,
    ) -> Result<BridgeOutput, BridgeError>;
}

/// Serialize parameters to the compact wire form passed on the command line.
pub fn encode_params(params: &BridgeParams) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(params)?)
}

/// Decode process stdout into a result object.
pub fn decode_output(operation: &str, stdout: &str) -> Result<Map<String, Value>, BridgeError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::Decode {
            operation: operation.to_string(),
            message: "empty output".to_string(),
            output: String::new(),
        });
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BridgeError::Decode {
            operation: operation.to_string(),
            message: format!("expected an object, got {}", json_kind(&other)),
            output: trimmed.to_string(),
        }),
        Err(e) => Err(BridgeError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
            output: trimmed.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
