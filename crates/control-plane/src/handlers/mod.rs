//! HTTP handlers for the pipeline control plane API.

pub mod health;
pub mod pipeline;
pub mod validation;

pub use health::{api_health, health_check};
