//! Configuration for the pipeline control plane.
//!
//! Everything is read from environment variables with `envy`:
//! `PIPELINE_*` for the server, `PIPELINE_BRIDGE_*` for the bridge
//! process and `POSTGRES_*` for the PostgreSQL store.

mod app;
mod database;

pub use app::{AppConfig, StorageBackend};
pub use database::DatabaseConfig;
pub use pipeline_bridge::BridgeConfig;

/// Load bridge process settings from `PIPELINE_BRIDGE_*` variables.
pub fn bridge_config_from_env() -> Result<BridgeConfig, envy::Error> {
    envy::prefixed("PIPELINE_BRIDGE_").from_env::<BridgeConfig>()
}
