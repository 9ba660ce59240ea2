//! Database module for roster, exam and schedule storage.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, scheduling services)      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - CRUD with validation     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! │  - StudentRepository                                     │
//! │  - ExamRepository                                        │
//! │  - ScheduleRepository                                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────────┐  ┌──────────▼──────────────┐
//! │ Postgres Repository  │  │ Local Repository        │
//! │ (Diesel + r2d2)      │  │ (in-memory)             │
//! └──────────────────────┘  └─────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use lab_scheduler::db::{services, RepositoryConfig, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepositoryConfig::load()?;
//!     let repo = RepositoryFactory::from_repository_config(&config).await?;
//!     let students = services::list_students(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::{ExportSettings, RepositoryConfig};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CommitMode, ErrorContext, ExamRepository, FullRepository, RepositoryError, RepositoryResult,
    ScheduleRepository, StudentRepository,
};
