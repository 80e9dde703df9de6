//! Shared application state passed to every handler.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::ExecutionRepository;
use crate::engine::PipelineCoordinator;
use crate::services::ValidationService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: PipelineCoordinator,

    /// Same store the coordinator writes to
    pub repository: Arc<dyn ExecutionRepository>,

    pub validation: ValidationService,

    pub config: Arc<AppConfig>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        coordinator: PipelineCoordinator,
        validation: ValidationService,
        config: AppConfig,
    ) -> Self {
        Self {
            repository: coordinator.repository().clone(),
            coordinator,
            validation,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
