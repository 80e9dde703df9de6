//! Registry Pipeline Control Plane
//!
//! Integrates external system schemas into the object registry by running
//! each integration request through an ordered pipeline of steps
//! (validate-schema, define-schema, update-registry, generate-docs by
//! default). Steps run in-process or through the out-of-process bridge.
//!
//! ## Modules
//!
//! - [`catalog`]: Declarative step lists per system
//! - [`config`]: Configuration loading from environment variables
//! - [`db`]: Execution records and their stores
//! - [`engine`]: Step executors and the pipeline coordinator
//! - [`error`]: Error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`router`]: Route table
//! - [`services`]: Standalone validation
//! - [`state`]: Shared application state
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pipeline_bridge::ProcessBridge;
//! use pipeline_control_plane::{
//!     catalog::PipelineCatalog,
//!     config::{bridge_config_from_env, AppConfig},
//!     db::InMemoryExecutionRepository,
//!     engine::{PipelineCoordinator, StepExecutors},
//! };
//!
//! let bridge = Arc::new(ProcessBridge::new(&bridge_config_from_env()?));
//! let coordinator = PipelineCoordinator::new(
//!     Arc::new(InMemoryExecutionRepository::new()),
//!     StepExecutors::with_bridge(bridge),
//!     Arc::new(PipelineCatalog::builtin()),
//! );
//! let execution_id = coordinator.start("hvac-v2", None).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod result_ext;
pub mod router;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
pub use router::build_router;
