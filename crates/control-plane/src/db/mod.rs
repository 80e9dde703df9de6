//! Execution storage for the pipeline control plane.
//!
//! The coordinator and handlers only see [`ExecutionRepository`]. Two
//! backends are provided: an in-memory store and PostgreSQL via SQLx.

pub mod memory;
pub mod models;
pub mod pool;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryExecutionRepository;
pub use pool::{create_pool, DbPool};
pub use postgres::PostgresExecutionRepository;
pub use repository::{ExecutionRepository, RepositoryError, RepositoryResult};
