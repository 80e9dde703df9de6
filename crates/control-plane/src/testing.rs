//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use pipeline_bridge::{BridgeClient, BridgeError, BridgeOutput, BridgeParams};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{Execution, ExecutionMetrics, PipelineConfiguration};
use crate::db::{ExecutionRepository, InMemoryExecutionRepository, RepositoryError, RepositoryResult};

/// In-process bridge with scripted failures. Records every call.
#[derive(Debug, Default)]
pub struct ScriptedBridge {
    failures: HashMap<String, String>,
    fail_at: Option<(usize, String)>,
    delay: Duration,
    calls: Mutex<Vec<(String, BridgeParams)>>,
}

impl ScriptedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call to `operation`.
    pub fn fail_on(mut self, operation: &str, message: &str) -> Self {
        self.failures
            .insert(operation.to_string(), message.to_string());
        self
    }

    /// Fail the `index`-th call (0-based).
    pub fn fail_at_call(mut self, index: usize, message: &str) -> Self {
        self.fail_at = Some((index, message.to_string()));
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(op, _)| op.clone())
            .collect()
    }

    pub fn params(&self) -> Vec<BridgeParams> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl BridgeClient for ScriptedBridge {
    async fn invoke(
        &self,
        operation: &str,
        params: &BridgeParams,
    ) -> Result<BridgeOutput, BridgeError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((operation.to_string(), params.clone()));
            calls.len() - 1
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = match &self.fail_at {
            Some((at, message)) if *at == index => Some(message.clone()),
            _ => self.failures.get(operation).cloned(),
        };
        if let Some(message) = scripted {
            return Err(BridgeError::Invocation {
                operation: operation.to_string(),
                message,
                exit_code: Some(1),
            });
        }

        let mut data = Map::new();
        data.insert("operation".to_string(), Value::String(operation.to_string()));
        data.insert("call".to_string(), Value::from(index));
        Ok(BridgeOutput::new(data).with_duration(self.delay.as_millis() as u64))
    }
}

/// Wraps the in-memory store and fails chosen updates.
#[derive(Debug, Default)]
pub struct FlakyRepository {
    inner: InMemoryExecutionRepository,
    terminal_failures: AtomicUsize,
    fail_intermediate: bool,
    terminal_attempts: AtomicUsize,
}

impl FlakyRepository {
    /// Fail the first `count` updates of a terminal record.
    pub fn failing_terminal_writes(count: usize) -> Self {
        Self {
            terminal_failures: AtomicUsize::new(count),
            ..Self::default()
        }
    }

    /// Fail every update of a non-terminal record.
    pub fn failing_intermediate_writes() -> Self {
        Self {
            fail_intermediate: true,
            ..Self::default()
        }
    }

    pub fn terminal_attempts(&self) -> usize {
        self.terminal_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionRepository for FlakyRepository {
    async fn create(&self, execution: &Execution) -> RepositoryResult<()> {
        self.inner.create(execution).await
    }

    async fn update(&self, execution: &Execution) -> RepositoryResult<()> {
        if execution.is_terminal() {
            self.terminal_attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.terminal_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.terminal_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(RepositoryError::Unavailable("connection reset".to_string()));
            }
        } else if self.fail_intermediate {
            return Err(RepositoryError::Unavailable("connection reset".to_string()));
        }
        self.inner.update(execution).await
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Execution> {
        self.inner.get(id).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Execution>> {
        self.inner.list().await
    }

    async fn get_metrics(&self) -> RepositoryResult<ExecutionMetrics> {
        self.inner.get_metrics().await
    }

    async fn get_configurations(&self, system: &str) -> RepositoryResult<Vec<PipelineConfiguration>> {
        self.inner.get_configurations(system).await
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}

/// Poll until the execution reaches a terminal status.
pub async fn wait_for_terminal(repository: &Arc<dyn ExecutionRepository>, id: Uuid) -> Execution {
    for _ in 0..1000 {
        let execution = repository.get(id).await.unwrap();
        if execution.is_terminal() {
            return execution;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("execution {} did not finish", id);
}
