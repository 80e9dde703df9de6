//! Step executors.
//!
//! A step is satisfied either in-process by a registered
//! [`NativeOperation`] or out of process through the injected
//! [`BridgeClient`]. [`StepExecutors`] picks one by the step's
//! [`Orchestrator`].

use async_trait::async_trait;
use pipeline_bridge::{BridgeClient, BridgeError, BridgeParams};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::{Execution, Orchestrator, Step, StepStatus};

/// Structured result of a step, merged into the step's metadata.
pub type StepOutput = Map<String, Value>;

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// No native operation registered under this name
    #[error("Unknown native operation: {0}")]
    UnknownOperation(String),

    /// A native operation reported failure
    #[error("Native operation '{operation}' failed: {message}")]
    Native { operation: String, message: String },
}

impl StepError {
    pub fn native(operation: &str, message: impl Into<String>) -> Self {
        Self::Native {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// What a step can see of the execution it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StepContext {
    pub execution_id: Uuid,
    pub system: String,
    pub object_type: Option<String>,
    /// Name and metadata of each completed step, in execution order.
    pub previous: Vec<(String, Map<String, Value>)>,
}

impl StepContext {
    pub fn from_execution(execution: &Execution) -> Self {
        let previous = execution
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .map(|s| (s.name.clone(), s.metadata.clone()))
            .collect();

        Self {
            execution_id: execution.id,
            system: execution.system.clone(),
            object_type: execution.object_type.clone(),
            previous,
        }
    }

    /// Bridge parameters identifying this execution.
    pub fn bridge_params(&self) -> BridgeParams {
        let mut params = BridgeParams::new();
        params.insert("system".to_string(), self.system.clone());
        if let Some(object_type) = &self.object_type {
            params.insert("object_type".to_string(), object_type.clone());
        }
        params.insert("execution_id".to_string(), self.execution_id.to_string());
        params
    }
}

/// Runs one step.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepOutput, StepError>;
}

/// An in-process operation addressable by step name.
#[async_trait]
pub trait NativeOperation: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &StepContext) -> Result<StepOutput, StepError>;
}

/// Executes steps with registered in-process operations.
#[derive(Clone, Default)]
pub struct NativeExecutor {
    operations: HashMap<String, Arc<dyn NativeOperation>>,
}

impl NativeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with the built-in operations registered.
    pub fn with_builtins() -> Self {
        let mut executor = Self::new();
        executor.register(SummarizeExecution);
        executor
    }

    pub fn register<T: NativeOperation + 'static>(&mut self, operation: T) {
        self.operations
            .insert(operation.name().to_string(), Arc::new(operation));
    }

    /// Registered operation names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for NativeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeExecutor")
            .field("operations", &self.list())
            .finish()
    }
}

#[async_trait]
impl StepExecutor for NativeExecutor {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepOutput, StepError> {
        let operation = self
            .operations
            .get(&step.name)
            .ok_or_else(|| StepError::UnknownOperation(step.name.clone()))?;
        debug!(step = %step.name, execution_id = %ctx.execution_id, "Running native operation");
        operation.run(ctx).await
    }
}

/// Collects the names and metadata of the steps completed so far.
#[derive(Debug, Clone, Copy)]
pub struct SummarizeExecution;

#[async_trait]
impl NativeOperation for SummarizeExecution {
    fn name(&self) -> &'static str {
        "summarize-execution"
    }

    async fn run(&self, ctx: &StepContext) -> Result<StepOutput, StepError> {
        let mut output = Map::new();
        output.insert("system".to_string(), Value::String(ctx.system.clone()));
        output.insert(
            "completed_steps".to_string(),
            ctx.previous
                .iter()
                .map(|(name, _)| Value::String(name.clone()))
                .collect(),
        );
        output.insert(
            "results".to_string(),
            ctx.previous
                .iter()
                .map(|(name, metadata)| (name.clone(), Value::Object(metadata.clone())))
                .collect::<Map<String, Value>>()
                .into(),
        );
        Ok(output)
    }
}

/// Executes steps through the bridge, using the step name as the operation.
#[derive(Clone)]
pub struct BridgeExecutor {
    client: Arc<dyn BridgeClient>,
}

impl BridgeExecutor {
    pub fn new(client: Arc<dyn BridgeClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn BridgeClient> {
        &self.client
    }
}

#[async_trait]
impl StepExecutor for BridgeExecutor {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepOutput, StepError> {
        let output = self.client.invoke(&step.name, &ctx.bridge_params()).await?;
        debug!(
            step = %step.name,
            execution_id = %ctx.execution_id,
            duration_ms = output.duration_ms,
            "Bridge step finished"
        );
        Ok(output.data)
    }
}

/// One executor per orchestrator kind.
#[derive(Clone)]
pub struct StepExecutors {
    native: NativeExecutor,
    bridge: BridgeExecutor,
}

impl StepExecutors {
    pub fn new(native: NativeExecutor, bridge: BridgeExecutor) -> Self {
        Self { native, bridge }
    }

    /// Built-in native operations plus the given bridge.
    pub fn with_bridge(client: Arc<dyn BridgeClient>) -> Self {
        Self::new(NativeExecutor::with_builtins(), BridgeExecutor::new(client))
    }

    pub fn executor_for(&self, orchestrator: Orchestrator) -> &dyn StepExecutor {
        match orchestrator {
            Orchestrator::Native => &self.native,
            Orchestrator::Bridge => &self.bridge,
        }
    }

    pub async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepOutput, StepError> {
        self.executor_for(step.orchestrator).execute(step, ctx).await
    }
}
