//! In-process execution store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{Execution, ExecutionMetrics, PipelineConfiguration};
use crate::db::repository::{ExecutionRepository, RepositoryError, RepositoryResult};

/// Execution repository held in memory.
///
/// Every operation takes the lock once and never awaits while holding it,
/// so a create followed by a get from another task observes the record.
#[derive(Debug, Default)]
pub struct InMemoryExecutionRepository {
    executions: RwLock<HashMap<Uuid, Execution>>,
    configurations: RwLock<Vec<PipelineConfiguration>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed configuration entries.
    pub fn with_configurations(configurations: Vec<PipelineConfiguration>) -> Self {
        Self {
            executions: RwLock::new(HashMap::new()),
            configurations: RwLock::new(configurations),
        }
    }

    /// Add a configuration entry.
    pub fn add_configuration(&self, configuration: PipelineConfiguration) -> RepositoryResult<()> {
        self.configurations
            .write()
            .map_err(|_| poisoned())?
            .push(configuration);
        Ok(())
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("execution store lock poisoned".to_string())
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn create(&self, execution: &Execution) -> RepositoryResult<()> {
        let mut executions = self.executions.write().map_err(|_| poisoned())?;
        if executions.contains_key(&execution.id) {
            return Err(RepositoryError::Duplicate(execution.id));
        }
        executions.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> RepositoryResult<()> {
        let mut executions = self.executions.write().map_err(|_| poisoned())?;
        match executions.get_mut(&execution.id) {
            Some(stored) => {
                *stored = execution.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(execution.id)),
        }
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Execution> {
        self.executions
            .read()
            .map_err(|_| poisoned())?
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn list(&self) -> RepositoryResult<Vec<Execution>> {
        let mut all: Vec<Execution> = self
            .executions
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_metrics(&self) -> RepositoryResult<ExecutionMetrics> {
        let executions = self.executions.read().map_err(|_| poisoned())?;
        Ok(ExecutionMetrics::from_executions(executions.values()))
    }

    async fn get_configurations(&self, system: &str) -> RepositoryResult<Vec<PipelineConfiguration>> {
        let configurations = self.configurations.read().map_err(|_| poisoned())?;
        Ok(configurations
            .iter()
            .filter(|c| c.system == system)
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ExecutionStatus, Orchestrator, Step};
    use chrono::Utc;

    fn execution(system: &str) -> Execution {
        Execution::new(
            system,
            None,
            vec![Step::new("1", "validate-schema", "Validate", Orchestrator::Bridge)],
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryExecutionRepository::new();
        let exec = execution("hvac-v2");
        repo.create(&exec).await.unwrap();

        assert_eq!(repo.get(exec.id).await.unwrap(), exec);
        assert!(matches!(
            repo.create(&exec).await,
            Err(RepositoryError::Duplicate(id)) if id == exec.id
        ));
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let repo = InMemoryExecutionRepository::new();
        let id = Uuid::new_v4();
        assert!(matches!(repo.get(id).await, Err(RepositoryError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let repo = InMemoryExecutionRepository::new();
        let exec = execution("hvac-v2");
        assert!(matches!(repo.update(&exec).await, Err(RepositoryError::NotFound(_))));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_update_is_idempotent() {
        let repo = InMemoryExecutionRepository::new();
        let mut exec = execution("hvac-v2");
        repo.create(&exec).await.unwrap();

        exec.fail(Utc::now(), "bridge exited 1").unwrap();
        repo.update(&exec).await.unwrap();
        let first = repo.get(exec.id).await.unwrap();
        repo.update(&exec).await.unwrap();
        let second = repo.get(exec.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.status, ExecutionStatus::Failed);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_creation() {
        let repo = InMemoryExecutionRepository::new();
        let first = execution("hvac-v2");
        let mut second = execution("lighting");
        second.created_at = first.created_at + chrono::Duration::milliseconds(1);
        repo.create(&second).await.unwrap();
        repo.create(&first).await.unwrap();

        let listed: Vec<Uuid> = repo.list().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(listed, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_configurations_by_system() {
        let repo = InMemoryExecutionRepository::with_configurations(vec![
            PipelineConfiguration::new("hvac-v2", None, "registry-mapping", serde_json::json!({"prefix": "hvac"})),
            PipelineConfiguration::new("lighting", None, "registry-mapping", serde_json::json!({})),
        ]);
        repo.add_configuration(PipelineConfiguration::new(
            "hvac-v2",
            Some("air-handler".to_string()),
            "symbols",
            serde_json::json!(["ahu"]),
        ))
        .unwrap();

        let hvac = repo.get_configurations("hvac-v2").await.unwrap();
        assert_eq!(hvac.len(), 2);
        assert!(hvac.iter().all(|c| c.system == "hvac-v2"));
        assert!(repo.get_configurations("plumbing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics() {
        let repo = InMemoryExecutionRepository::new();
        let mut done = execution("hvac-v2");
        repo.create(&done).await.unwrap();
        done.complete(Utc::now()).unwrap();
        repo.update(&done).await.unwrap();
        repo.create(&execution("hvac-v2")).await.unwrap();

        let metrics = repo.get_metrics().await.unwrap();
        assert_eq!(metrics.total_executions, 2);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.running, 1);
        assert_eq!(metrics.success_rate, 100.0);
        assert_eq!(repo.backend(), "memory");
        assert!(repo.health_check().await);
    }
}
