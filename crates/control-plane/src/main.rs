//! Registry Pipeline Control Plane Server
//!
//! Accepts integration requests over HTTP, runs their pipelines in the
//! background and serves execution status, metrics and pre-flight
//! validation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline_bridge::ProcessBridge;
use pipeline_control_plane::{
    build_router,
    catalog::{load_catalog, PipelineCatalog},
    config::{bridge_config_from_env, AppConfig, BridgeConfig, DatabaseConfig, StorageBackend},
    db::{create_pool, ExecutionRepository, InMemoryExecutionRepository, PostgresExecutionRepository},
    engine::{PipelineCoordinator, StepExecutors, TerminalWritePolicy},
    services::ValidationService,
    state::AppState,
};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,pipeline_control_plane=debug,pipeline_bridge=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the configured execution store and seed catalog configurations.
async fn open_repository(
    app_config: &AppConfig,
    catalog: &PipelineCatalog,
) -> anyhow::Result<Arc<dyn ExecutionRepository>> {
    let configurations = catalog.configuration_records();

    match app_config.storage {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory execution store");
            Ok(Arc::new(InMemoryExecutionRepository::with_configurations(
                configurations,
            )))
        }
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load database config, using defaults");
                DatabaseConfig::default()
            });
            tracing::info!(url = %db_config.display_url(), "Using PostgreSQL execution store");

            let pool = create_pool(&db_config).await?;
            let repository = PostgresExecutionRepository::new(pool);
            repository.init_schema().await?;

            for configuration in configurations {
                let existing = repository
                    .get_configurations(&configuration.system)
                    .await?;
                let present = existing.iter().any(|c| {
                    c.name == configuration.name && c.object_type == configuration.object_type
                });
                if !present {
                    repository.insert_configuration(&configuration).await?;
                }
            }

            Ok(Arc::new(repository))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Registry Pipeline Control Plane"
    );

    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    });

    let bridge_config = bridge_config_from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load bridge config, using defaults");
        BridgeConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        storage = ?app_config.storage,
        interpreter = %bridge_config.interpreter,
        script = %bridge_config.script_path().display(),
        bridge_timeout_seconds = bridge_config.timeout_seconds,
        "Configuration loaded"
    );
    if !bridge_config.script_path().exists() {
        tracing::warn!(
            script = %bridge_config.script_path().display(),
            "Bridge script not found, bridge steps will fail"
        );
    }

    let catalog = match &app_config.catalog_path {
        Some(path) => {
            let catalog = load_catalog(path)?;
            tracing::info!(
                path = %path.display(),
                systems = catalog.systems.len(),
                "Step catalog loaded"
            );
            catalog
        }
        None => PipelineCatalog::builtin(),
    };

    let repository = open_repository(&app_config, &catalog).await?;
    let bridge = Arc::new(ProcessBridge::new(&bridge_config));

    let coordinator = PipelineCoordinator::new(
        repository,
        StepExecutors::with_bridge(bridge.clone()),
        Arc::new(catalog),
    )
    .with_terminal_write_policy(TerminalWritePolicy::from(&app_config));

    let state = AppState::new(coordinator.clone(), ValidationService::new(bridge), app_config.clone());
    let app = build_router(state);

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let drained = coordinator.drain().await;
    tracing::info!(runs = drained, "Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
