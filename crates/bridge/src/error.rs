//! Bridge error types.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an operation through the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The interpreter could not be started, or it exited unsuccessfully.
    #[error("Bridge invocation failed for '{operation}': {message}")]
    Invocation {
        operation: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// The interpreter did not finish within the configured lifetime.
    #[error("Bridge operation '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// The interpreter finished but its output was not a structured result.
    #[error("Bridge output for '{operation}' could not be decoded: {message} (output: {output})")]
    Decode {
        operation: String,
        message: String,
        output: String,
    },

    /// The parameter map could not be serialized.
    #[error("Bridge parameters could not be encoded: {0}")]
    Encode(String),
}

impl BridgeError {
    /// Name of the operation that failed, when known.
    pub fn operation(&self) -> Option<&str> {
        match self {
            BridgeError::Invocation { operation, .. }
            | BridgeError::Timeout { operation, .. }
            | BridgeError::Decode { operation, .. } => Some(operation),
            BridgeError::Encode(_) => None,
        }
    }

    /// Returns true if the process was killed for exceeding its lifetime.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    /// Returns true if the output could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, BridgeError::Decode { .. })
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Encode(e.to_string())
    }
}
