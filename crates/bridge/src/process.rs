//! Out-of-process bridge client.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::client::{decode_output, encode_params, BridgeClient, BridgeOutput, BridgeParams};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Bridge client that spawns the configured interpreter once per call.
///
/// Protocol:
/// - invoked as `<interpreter> <script> <operation> <params-json>`
/// - working directory is the bridge root
/// - a single JSON object on stdout means success
/// - a non-zero exit code means failure
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    interpreter: String,
    /// Passed as-is; a relative path resolves against `root`.
    script: PathBuf,
    root: PathBuf,
    timeout: Duration,
    fail_on_stderr: bool,
}

impl ProcessBridge {
    /// Create a process bridge from configuration.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script: config.script.clone(),
            root: config.root.clone(),
            timeout: config.timeout(),
            fail_on_stderr: config.fail_on_stderr,
        }
    }

    /// Override the process lifetime bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, operation: &str, encoded: &str) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script)
            .arg(operation)
            .arg(encoded)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl BridgeClient for ProcessBridge {
    async fn invoke(
        &self,
        operation: &str,
        params: &BridgeParams,
    ) -> Result<BridgeOutput, BridgeError> {
        let encoded = encode_params(params)?;
        let start = Instant::now();

        tracing::debug!(
            operation = %operation,
            interpreter = %self.interpreter,
            script = %self.script.display(),
            timeout = ?self.timeout,
            "Invoking bridge"
        );

        let child = self
            .command(operation, &encoded)
            .spawn()
            .map_err(|e| BridgeError::Invocation {
                operation: operation.to_string(),
                message: format!("failed to start '{}': {}", self.interpreter, e),
                exit_code: None,
            })?;

        // Dropping the wait future on expiry drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| BridgeError::Invocation {
                operation: operation.to_string(),
                message: format!("failed to wait for process: {}", e),
                exit_code: None,
            })?,
            Err(_) => {
                tracing::warn!(
                    operation = %operation,
                    timeout = ?self.timeout,
                    "Bridge process exceeded its lifetime and was killed"
                );
                return Err(BridgeError::Timeout {
                    operation: operation.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let exit_code = output.status.code();
            return Err(BridgeError::Invocation {
                operation: operation.to_string(),
                message: format!(
                    "exit code {}: {}",
                    exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()),
                    combined_output(&stdout, &stderr)
                ),
                exit_code,
            });
        }

        if !stderr.trim().is_empty() {
            if self.fail_on_stderr {
                return Err(BridgeError::Invocation {
                    operation: operation.to_string(),
                    message: format!("stderr output: {}", combined_output(&stdout, &stderr)),
                    exit_code: Some(0),
                });
            }
            tracing::warn!(operation = %operation, stderr = %stderr.trim(), "Bridge wrote to stderr");
        }

        let data = decode_output(operation, &stdout)?;

        tracing::debug!(operation = %operation, duration_ms, "Bridge operation completed");

        Ok(BridgeOutput::new(data).with_duration(duration_ms))
    }
}

fn combined_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim(), stderr.trim()) {
        ("", "") => "(no output)".to_string(),
        (out, "") => out.to_string(),
        ("", err) => err.to_string(),
        (out, err) => format!("{}\n{}", err, out),
    }
}
