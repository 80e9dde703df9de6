//! Execution repository contract.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Execution, ExecutionMetrics, PipelineConfiguration};

/// Errors raised by an execution store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No execution with this id.
    #[error("Execution not found: {0}")]
    NotFound(Uuid),

    /// An execution with this id already exists.
    #[error("Execution already exists: {0}")]
    Duplicate(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store cannot serve requests
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Durable store for execution records, keyed by execution id.
///
/// Records are always written whole. `update` is a full overwrite and must
/// be safe to call repeatedly with the same or a later state of a record.
/// Distinct executions are written concurrently by independent run tasks.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Persist a new execution.
    async fn create(&self, execution: &Execution) -> RepositoryResult<()>;

    /// Overwrite an existing execution.
    async fn update(&self, execution: &Execution) -> RepositoryResult<()>;

    /// Look up an execution by id.
    async fn get(&self, id: Uuid) -> RepositoryResult<Execution>;

    /// All executions, oldest first.
    async fn list(&self) -> RepositoryResult<Vec<Execution>>;

    /// Aggregate statistics over all executions.
    async fn get_metrics(&self) -> RepositoryResult<ExecutionMetrics>;

    /// Stored configuration entries for a system.
    async fn get_configurations(&self, system: &str) -> RepositoryResult<Vec<PipelineConfiguration>>;

    /// Whether the store is reachable.
    async fn health_check(&self) -> bool {
        true
    }

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}
