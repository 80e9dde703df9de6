//! Service layer for the pipeline control plane.

pub mod validation;

pub use validation::{ValidationKind, ValidationService};
