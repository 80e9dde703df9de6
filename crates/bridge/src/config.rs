//! Bridge process configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the external interpreter process.
///
/// The bridge runs `<interpreter> <root>/<script> <operation> <params>` with
/// `root` as the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Interpreter executable (default: "python3").
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Bridge root directory, used as the working directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Bridge script, relative to `root` unless absolute.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Maximum process lifetime in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Treat any stderr output as a failure even on a zero exit code.
    #[serde(default = "default_true")]
    pub fail_on_stderr: bool,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_script() -> PathBuf {
    PathBuf::from("bridge.py")
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl BridgeConfig {
    /// Full path of the bridge script.
    pub fn script_path(&self) -> PathBuf {
        if self.script.is_absolute() {
            self.script.clone()
        } else {
            self.root.join(&self.script)
        }
    }

    /// Process lifetime bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            root: default_root(),
            script: default_script(),
            timeout_seconds: default_timeout_seconds(),
            fail_on_stderr: true,
        }
    }
}
