//! Application configuration for the pipeline control plane.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Execution store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `PIPELINE_`:
/// - `PIPELINE_HOST`: Server bind address (default: "0.0.0.0")
/// - `PIPELINE_PORT`: Server port (default: 8085)
/// - `PIPELINE_STORAGE`: `memory` or `postgres` (default: memory)
/// - `PIPELINE_CATALOG_PATH`: YAML step catalog (optional)
/// - `PIPELINE_TERMINAL_WRITE_ATTEMPTS`: attempts for the final status write (default: 3)
/// - `PIPELINE_TERMINAL_WRITE_BACKOFF_MS`: pause between those attempts (default: 200)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Execution store backend
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Step catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Attempts made to persist a terminal execution state
    #[serde(default = "default_terminal_write_attempts")]
    pub terminal_write_attempts: u32,

    /// Pause between terminal write attempts in milliseconds
    #[serde(default = "default_terminal_write_backoff_ms")]
    pub terminal_write_backoff_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_server_name() -> String {
    "registry-pipeline".to_string()
}

fn default_storage() -> StorageBackend {
    StorageBackend::Memory
}

fn default_terminal_write_attempts() -> u32 {
    3
}

fn default_terminal_write_backoff_ms() -> u64 {
    200
}

impl AppConfig {
    /// Load configuration from `PIPELINE_*` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("PIPELINE_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn terminal_write_backoff(&self) -> Duration {
        Duration::from_millis(self.terminal_write_backoff_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            server_name: default_server_name(),
            storage: default_storage(),
            catalog_path: None,
            terminal_write_attempts: default_terminal_write_attempts(),
            terminal_write_backoff_ms: default_terminal_write_backoff_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8085);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.terminal_write_attempts, 3);
        assert_eq!(config.terminal_write_backoff(), Duration::from_millis(200));
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8085");
    }

    #[test]
    fn test_from_iter() {
        let vars = vec![
            ("PORT".to_string(), "9000".to_string()),
            ("STORAGE".to_string(), "postgres".to_string()),
            ("CATALOG_PATH".to_string(), "/etc/pipeline/catalog.yaml".to_string()),
        ];
        let config: AppConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/etc/pipeline/catalog.yaml"))
        );
    }
}
