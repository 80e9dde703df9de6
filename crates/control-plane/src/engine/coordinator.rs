//! Pipeline coordinator.
//!
//! `start` persists a new execution and hands it to a tracked run task. The
//! run task advances the steps strictly in order and persists the record
//! after every transition:
//! - step begins: step `running`, `started_at` stamped
//! - step succeeds: step `completed`, output merged into its metadata
//! - step fails: step and execution `failed` with the same error, run stops
//! - all steps done: execution `completed`
//!
//! Intermediate writes are best effort. The terminal write is retried and
//! raises an alert when it cannot be stored. `drain` waits for every run
//! task still in flight.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::PipelineCatalog;
use crate::config::AppConfig;
use crate::db::models::{Execution, StepStatus, TransitionError};
use crate::db::{ExecutionRepository, RepositoryError};
use crate::error::{AppError, AppResult};
use crate::result_ext::ResultExt;

use super::executor::{StepContext, StepExecutors};

/// How hard the coordinator tries to store a terminal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalWritePolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for TerminalWritePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

impl From<&AppConfig> for TerminalWritePolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            attempts: config.terminal_write_attempts.max(1),
            backoff: config.terminal_write_backoff(),
        }
    }
}

/// Why a run ended without a stored terminal record.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Terminal state of execution {id} not persisted after {attempts} attempts: {source}")]
    TerminalWrite {
        id: Uuid,
        attempts: u32,
        #[source]
        source: RepositoryError,
    },
}

/// Drives executions through their steps.
#[derive(Clone)]
pub struct PipelineCoordinator {
    repository: Arc<dyn ExecutionRepository>,
    executors: StepExecutors,
    catalog: Arc<PipelineCatalog>,
    terminal_write: TerminalWritePolicy,
    runs: Arc<Mutex<JoinSet<()>>>,
}

impl PipelineCoordinator {
    pub fn new(
        repository: Arc<dyn ExecutionRepository>,
        executors: StepExecutors,
        catalog: Arc<PipelineCatalog>,
    ) -> Self {
        Self {
            repository,
            executors,
            catalog,
            terminal_write: TerminalWritePolicy::default(),
            runs: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn with_terminal_write_policy(mut self, policy: TerminalWritePolicy) -> Self {
        self.terminal_write = policy;
        self
    }

    pub fn repository(&self) -> &Arc<dyn ExecutionRepository> {
        &self.repository
    }

    pub fn catalog(&self) -> &PipelineCatalog {
        &self.catalog
    }

    /// Create an execution and run it in the background.
    ///
    /// Returns once the record is stored, before any step runs.
    pub async fn start(&self, system: &str, object_type: Option<&str>) -> AppResult<Uuid> {
        let system = system.trim();
        if system.is_empty() {
            return Err(AppError::Validation("system is required".to_string()));
        }
        let object_type = object_type.map(str::trim).filter(|t| !t.is_empty());

        let steps = self.catalog.build_steps(system, object_type);
        let execution = Execution::new(system, object_type.map(str::to_string), steps);
        let execution_id = execution.id;

        self.repository.create(&execution).await?;
        info!(
            execution_id = %execution_id,
            system = %system,
            object_type = ?object_type,
            steps = execution.steps.len(),
            "Pipeline execution accepted"
        );

        let coordinator = self.clone();
        let mut runs = self.runs.lock().await;
        while runs.try_join_next().is_some() {}
        runs.spawn(async move {
            if let Err(e) = coordinator.run(execution).await {
                error!(execution_id = %execution_id, error = %e, "Pipeline run aborted");
            }
        });

        Ok(execution_id)
    }

    /// Wait for every run task started so far. Returns how many were awaited.
    pub async fn drain(&self) -> usize {
        let mut drained = 0;
        loop {
            let mut runs = std::mem::take(&mut *self.runs.lock().await);
            if runs.is_empty() {
                return drained;
            }
            info!(runs = runs.len(), "Waiting for in-flight pipeline runs");
            while let Some(joined) = runs.join_next().await {
                drained += 1;
                if let Err(e) = joined {
                    error!(error = %e, "Pipeline run task panicked or was cancelled");
                }
            }
        }
    }

    /// Run the remaining steps of an execution to a terminal state.
    ///
    /// Completed steps are skipped. A step left `running` by an earlier run
    /// is failed along with the execution, as is a `failed` step whose
    /// execution is still open. Returns the final record once it is stored.
    pub async fn run(&self, mut execution: Execution) -> Result<Execution, RunError> {
        if execution.is_terminal() {
            return Ok(execution);
        }

        for index in 0..execution.steps.len() {
            match execution.steps[index].status {
                StepStatus::Completed => continue,
                StepStatus::Pending => {}
                StepStatus::Running => {
                    let message = format!(
                        "Step {} was interrupted before it finished",
                        execution.steps[index].name
                    );
                    warn!(execution_id = %execution.id, error = %message, "Step interrupted");
                    let now = Utc::now();
                    execution.steps[index].fail(now, message.clone())?;
                    execution.fail(now, message)?;
                    return self.persist_terminal(execution).await;
                }
                StepStatus::Failed => {
                    let step = &execution.steps[index];
                    let message = step
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("Step {} failed", step.name));
                    execution.fail(Utc::now(), message)?;
                    return self.persist_terminal(execution).await;
                }
            }

            let ctx = StepContext::from_execution(&execution);
            execution.steps[index].begin(Utc::now())?;
            info!(
                execution_id = %execution.id,
                step = %execution.steps[index].name,
                orchestrator = %execution.steps[index].orchestrator,
                "Step started"
            );
            self.persist(&execution, "step started").await;

            let result = self.executors.execute(&execution.steps[index], &ctx).await;
            let finished = Utc::now();

            match result {
                Ok(output) => {
                    execution.steps[index].complete(finished, output)?;
                    info!(
                        execution_id = %execution.id,
                        step = %execution.steps[index].name,
                        "Step completed"
                    );
                    self.persist(&execution, "step completed").await;
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        execution_id = %execution.id,
                        step = %execution.steps[index].name,
                        error = %message,
                        "Step failed"
                    );
                    execution.steps[index].fail(finished, message.clone())?;
                    execution.fail(finished, message)?;
                    return self.persist_terminal(execution).await;
                }
            }
        }

        execution.complete(Utc::now())?;
        info!(
            execution_id = %execution.id,
            system = %execution.system,
            duration_ms = execution.duration_ms().unwrap_or_default(),
            "Pipeline execution completed"
        );
        self.persist_terminal(execution).await
    }

    async fn persist(&self, execution: &Execution, transition: &str) {
        let _ = self
            .repository
            .update(execution)
            .await
            .log(format!("persisting execution {} ({})", execution.id, transition));
    }

    async fn persist_terminal(&self, execution: Execution) -> Result<Execution, RunError> {
        let attempts = self.terminal_write.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.repository.update(&execution).await {
                Ok(()) => return Ok(execution),
                Err(e) if attempt < attempts => {
                    warn!(
                        execution_id = %execution.id,
                        attempt,
                        error = %e,
                        "Terminal write failed, retrying"
                    );
                    tokio::time::sleep(self.terminal_write.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        target: "pipeline_control_plane::alert",
                        execution_id = %execution.id,
                        status = %execution.status,
                        attempts,
                        error = %e,
                        "Terminal execution state could not be persisted"
                    );
                    return Err(RunError::TerminalWrite {
                        id: execution.id,
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }
}
