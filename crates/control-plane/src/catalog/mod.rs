//! Pipeline step catalog.
//!
//! The catalog is the declarative table that decides which ordered steps
//! an execution runs:
//! - a `default` step list used for any system without its own entry
//! - per-system (or `system/object_type`) step lists
//! - configuration entries served by the configurations endpoint

pub mod parser;
pub mod types;

pub use parser::{load_catalog, parse_catalog, validate_catalog};
pub use types::{ConfigurationEntry, PipelineCatalog, StepDefinition};
