//! Stored pipeline configuration entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named configuration entry attached to an integrated system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PipelineConfiguration {
    pub id: Uuid,

    /// System the entry belongs to (e.g., "hvac-v2")
    pub system: String,

    /// Object type the entry is scoped to, if any
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Entry name (e.g., "registry-mapping")
    pub name: String,

    /// Free-form configuration document (JSON)
    pub config: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

impl PipelineConfiguration {
    /// Create a new configuration entry stamped with the current time.
    pub fn new(
        system: impl Into<String>,
        object_type: Option<String>,
        name: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            system: system.into(),
            object_type,
            name: name.into(),
            config,
            created_at: Utc::now(),
        }
    }
}
