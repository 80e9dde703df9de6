//! Data model for the pipeline control plane.
//!
//! Execution records are stored whole; configuration entries and
//! metrics are read-only views served alongside them.

pub mod configuration;
pub mod execution;
pub mod metrics;

pub use configuration::*;
pub use execution::*;
pub use metrics::*;
