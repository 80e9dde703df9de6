//! PostgreSQL execution store.
//!
//! Each execution is kept as one row: the full record as JSONB plus the
//! columns needed for filtering and metrics. Writes always replace the
//! whole row.

use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::models::{Execution, ExecutionMetrics, PipelineConfiguration, SystemMetrics};
use crate::db::pool::{health_check, DbPool};
use crate::db::repository::{ExecutionRepository, RepositoryError, RepositoryResult};

const SCHEMA_DDL: &str = r#"
CREATE SCHEMA IF NOT EXISTS pipeline;

CREATE TABLE IF NOT EXISTS pipeline.execution (
    id           UUID PRIMARY KEY,
    system       TEXT NOT NULL,
    object_type  TEXT,
    status       TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL,
    completed_at TIMESTAMPTZ,
    error        TEXT,
    record       JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS execution_system_idx ON pipeline.execution (system);

CREATE TABLE IF NOT EXISTS pipeline.configuration (
    id          UUID PRIMARY KEY,
    system      TEXT NOT NULL,
    object_type TEXT,
    name        TEXT NOT NULL,
    config      JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS configuration_system_idx ON pipeline.configuration (system);
"#;

/// Execution repository backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresExecutionRepository {
    pool: DbPool,
}

impl PostgresExecutionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the schema and tables if they do not exist.
    pub async fn init_schema(&self) -> RepositoryResult<()> {
        sqlx::raw_sql(SCHEMA_DDL).execute(&self.pool).await?;
        tracing::info!("Pipeline schema initialized");
        Ok(())
    }

    /// Insert a configuration entry.
    pub async fn insert_configuration(
        &self,
        configuration: &PipelineConfiguration,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pipeline.configuration (id, system, object_type, name, config, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(configuration.id)
        .bind(&configuration.system)
        .bind(&configuration.object_type)
        .bind(&configuration.name)
        .bind(&configuration.config)
        .bind(configuration.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn decode_record(record: serde_json::Value) -> RepositoryResult<Execution> {
    Ok(serde_json::from_value(record)?)
}

#[async_trait]
impl ExecutionRepository for PostgresExecutionRepository {
    async fn create(&self, execution: &Execution) -> RepositoryResult<()> {
        let record = serde_json::to_value(execution)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pipeline.execution
                (id, system, object_type, status, created_at, completed_at, error, record)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(execution.id)
        .bind(&execution.system)
        .bind(&execution.object_type)
        .bind(execution.status.to_string())
        .bind(execution.created_at)
        .bind(execution.completed_at)
        .bind(&execution.error)
        .bind(record)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::Duplicate(execution.id));
        }
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> RepositoryResult<()> {
        let record = serde_json::to_value(execution)?;

        let updated = sqlx::query(
            r#"
            UPDATE pipeline.execution
            SET status = $2, completed_at = $3, error = $4, record = $5
            WHERE id = $1
            "#,
        )
        .bind(execution.id)
        .bind(execution.status.to_string())
        .bind(execution.completed_at)
        .bind(&execution.error)
        .bind(record)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(execution.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Execution> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT record FROM pipeline.execution WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let (record,) = row.ok_or(RepositoryError::NotFound(id))?;
        decode_record(record)
    }

    async fn list(&self) -> RepositoryResult<Vec<Execution>> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as("SELECT record FROM pipeline.execution ORDER BY created_at ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|(record,)| decode_record(record)).collect()
    }

    #[allow(clippy::type_complexity)]
    async fn get_metrics(&self) -> RepositoryResult<ExecutionMetrics> {
        let rows: Vec<(String, i64, i64, i64, i64, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT
                system,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'running') AS running,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                (AVG(EXTRACT(EPOCH FROM (completed_at - created_at)))
                    FILTER (WHERE completed_at IS NOT NULL) * 1000)::FLOAT8 AS average_duration_ms
            FROM pipeline.execution
            GROUP BY system
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_system: BTreeMap<String, SystemMetrics> = rows
            .into_iter()
            .map(|(system, total, running, completed, failed, average_duration_ms)| {
                (
                    system,
                    SystemMetrics {
                        total,
                        running,
                        completed,
                        failed,
                        average_duration_ms,
                    },
                )
            })
            .collect();

        Ok(ExecutionMetrics::from_systems(by_system))
    }

    async fn get_configurations(&self, system: &str) -> RepositoryResult<Vec<PipelineConfiguration>> {
        let entries = sqlx::query_as::<_, PipelineConfiguration>(
            r#"
            SELECT id, system, object_type, name, config, created_at
            FROM pipeline.configuration
            WHERE system = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(system)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn health_check(&self) -> bool {
        health_check(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
