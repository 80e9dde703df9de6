//! Step catalog YAML parser.
//!
//! Example:
//!
//! ```yaml
//! default:
//!   - name: validate-schema
//!     description: Validate the system schema
//!   - name: define-schema
//! systems:
//!   lighting:
//!     - name: validate-schema
//!   hvac-v2/air-handler:
//!     - name: validate-symbol
//!       orchestrator: native
//! configurations:
//!   hvac-v2:
//!     - name: registry-mapping
//!       config: { prefix: hvac }
//! ```

use std::collections::HashSet;
use std::path::Path;

use crate::catalog::types::{PipelineCatalog, StepDefinition};
use crate::error::{AppError, AppResult};

/// Parse a YAML string into a step catalog.
pub fn parse_catalog(yaml_content: &str) -> AppResult<PipelineCatalog> {
    let catalog: PipelineCatalog =
        serde_yaml::from_str(yaml_content).map_err(|e| AppError::Parse(e.to_string()))?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> AppResult<PipelineCatalog> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Cannot read step catalog {}: {}", path.display(), e))
    })?;
    parse_catalog(&content)
}

/// Validate a parsed catalog.
pub fn validate_catalog(catalog: &PipelineCatalog) -> AppResult<()> {
    validate_steps("default", &catalog.default)?;

    for (key, steps) in &catalog.systems {
        if key.trim().is_empty() || key.starts_with('/') {
            return Err(AppError::Validation(format!(
                "Invalid system key '{}' in step catalog",
                key
            )));
        }
        validate_steps(key, steps)?;
    }

    for (system, entries) in &catalog.configurations {
        if let Some(entry) = entries.iter().find(|e| e.name.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "Configuration for '{}' has an empty name (object type: {:?})",
                system, entry.object_type
            )));
        }
    }

    Ok(())
}

fn validate_steps(list: &str, steps: &[StepDefinition]) -> AppResult<()> {
    if steps.is_empty() {
        return Err(AppError::Validation(format!(
            "Step list '{}' must contain at least one step",
            list
        )));
    }

    let mut seen = HashSet::new();
    for step in steps {
        if step.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Step list '{}' contains a step with an empty name",
                list
            )));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(AppError::Validation(format!(
                "Duplicate step name '{}' in step list '{}'",
                step.name, list
            )));
        }
    }

    Ok(())
}
