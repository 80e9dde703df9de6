//! Execution and step records.
//!
//! An [`Execution`] is one pipeline run for a system/object type pair. Its
//! [`Step`]s are created together with it, in execution order, and only
//! ever move forward through their states. The transition methods here are
//! the only way the coordinator mutates a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Which executor satisfies a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orchestrator {
    /// In-process operation.
    Native,
    /// Out-of-process operation run through the bridge.
    Bridge,
}

impl std::fmt::Display for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Bridge => write!(f, "bridge"),
        }
    }
}

/// Execution lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Returns true for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Step lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    /// Returns true for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A state change that would move a record backwards or out of a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity} transition from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    fn step(from: StepStatus, to: StepStatus) -> Self {
        Self {
            entity: "step",
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn execution(from: ExecutionStatus, to: ExecutionStatus) -> Self {
        Self {
            entity: "execution",
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// One unit of work within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Ordinal within the execution ("1", "2", ...).
    pub id: String,
    /// Operation name understood by the executor.
    pub name: String,
    pub description: String,
    pub orchestrator: Orchestrator,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Step results carried forward for later steps and reporting.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Step {
    /// Create a pending step.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            orchestrator,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
            metadata: Map::new(),
        }
    }

    /// pending -> running
    pub fn begin(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != StepStatus::Pending {
            return Err(TransitionError::step(self.status, StepStatus::Running));
        }
        self.status = StepStatus::Running;
        self.started_at = Some(at);
        Ok(())
    }

    /// running -> completed, merging the step output into metadata.
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        output: Map<String, Value>,
    ) -> Result<(), TransitionError> {
        if self.status != StepStatus::Running {
            return Err(TransitionError::step(self.status, StepStatus::Completed));
        }
        self.status = StepStatus::Completed;
        self.completed_at = Some(at);
        self.metadata.extend(output);
        Ok(())
    }

    /// running -> failed
    pub fn fail(&mut self, at: DateTime<Utc>, error: impl Into<String>) -> Result<(), TransitionError> {
        if self.status != StepStatus::Running {
            return Err(TransitionError::step(self.status, StepStatus::Failed));
        }
        self.status = StepStatus::Failed;
        self.completed_at = Some(at);
        self.error = Some(error.into());
        Ok(())
    }
}

/// One end-to-end pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    pub status: ExecutionStatus,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    /// Create a running execution with all steps pending.
    pub fn new(system: impl Into<String>, object_type: Option<String>, steps: Vec<Step>) -> Self {
        Self {
            id: Uuid::new_v4(),
            system: system.into(),
            object_type,
            status: ExecutionStatus::Running,
            steps,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Returns true once the execution is completed or failed.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// running -> completed
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != ExecutionStatus::Running {
            return Err(TransitionError::execution(
                self.status,
                ExecutionStatus::Completed,
            ));
        }
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    /// running -> failed
    pub fn fail(&mut self, at: DateTime<Utc>, error: impl Into<String>) -> Result<(), TransitionError> {
        if self.status != ExecutionStatus::Running {
            return Err(TransitionError::execution(self.status, ExecutionStatus::Failed));
        }
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(at);
        self.error = Some(error.into());
        Ok(())
    }

    /// The step currently running, if any.
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.status == StepStatus::Running)
    }

    /// Wall time from creation to completion, for terminal executions.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_milliseconds())
    }

    /// Checks the record-level invariants: `completed_at` is set exactly
    /// when the status is terminal, at most one step is running, and no
    /// step runs after a terminal status.
    pub fn is_consistent(&self) -> bool {
        let running = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Running)
            .count();

        self.completed_at.is_some() == self.is_terminal()
            && running <= 1
            && !(self.is_terminal() && running > 0)
            && (self.status == ExecutionStatus::Failed) == self.error.is_some()
    }
}
