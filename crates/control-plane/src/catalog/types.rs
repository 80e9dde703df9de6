//! Step catalog types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::models::{Orchestrator, PipelineConfiguration, Step};

/// One step of a pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Operation name passed to the executor.
    pub name: String,

    /// Human-readable label.
    #[serde(default)]
    pub description: String,

    #[serde(default = "default_orchestrator")]
    pub orchestrator: Orchestrator,
}

fn default_orchestrator() -> Orchestrator {
    Orchestrator::Bridge
}

impl StepDefinition {
    pub fn bridge(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            orchestrator: Orchestrator::Bridge,
        }
    }

    pub fn native(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            orchestrator: Orchestrator::Native,
        }
    }
}

/// A configuration entry declared in the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(default)]
    pub config: serde_json::Value,
}

/// Declarative mapping from system to its ordered step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineCatalog {
    /// Steps for systems without their own entry.
    #[serde(default = "default_steps")]
    pub default: Vec<StepDefinition>,

    /// Keyed by `system` or `system/object_type`.
    #[serde(default)]
    pub systems: BTreeMap<String, Vec<StepDefinition>>,

    /// Configuration entries keyed by system.
    #[serde(default)]
    pub configurations: BTreeMap<String, Vec<ConfigurationEntry>>,
}

/// validate-schema, define-schema, update-registry, generate-docs
fn default_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::bridge("validate-schema", "Validate the system schema"),
        StepDefinition::bridge("define-schema", "Define the schema in the object registry"),
        StepDefinition::bridge("update-registry", "Update the object registry"),
        StepDefinition::bridge("generate-docs", "Generate registry documentation"),
    ]
}

impl Default for PipelineCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PipelineCatalog {
    /// The built-in catalog: every system runs the default step list.
    pub fn builtin() -> Self {
        Self {
            default: default_steps(),
            systems: BTreeMap::new(),
            configurations: BTreeMap::new(),
        }
    }

    /// Ordered step definitions for a system.
    ///
    /// Lookup order is `system/object_type`, then `system`, then the
    /// default list.
    pub fn steps_for(&self, system: &str, object_type: Option<&str>) -> &[StepDefinition] {
        if let Some(object_type) = object_type {
            if let Some(steps) = self.systems.get(&format!("{}/{}", system, object_type)) {
                return steps;
            }
        }
        self.systems
            .get(system)
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }

    /// Fresh pending steps for a new execution, numbered from 1.
    pub fn build_steps(&self, system: &str, object_type: Option<&str>) -> Vec<Step> {
        self.steps_for(system, object_type)
            .iter()
            .enumerate()
            .map(|(i, definition)| {
                Step::new(
                    (i + 1).to_string(),
                    definition.name.clone(),
                    definition.description.clone(),
                    definition.orchestrator,
                )
            })
            .collect()
    }

    /// Configuration records declared in the catalog.
    pub fn configuration_records(&self) -> Vec<PipelineConfiguration> {
        self.configurations
            .iter()
            .flat_map(|(system, entries)| {
                entries.iter().map(move |entry| {
                    PipelineConfiguration::new(
                        system.clone(),
                        entry.object_type.clone(),
                        entry.name.clone(),
                        entry.config.clone(),
                    )
                })
            })
            .collect()
    }
}
