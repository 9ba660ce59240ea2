//! Repository traits: the storage port of the scheduler.
//!
//! The traits are split by aggregate, mirroring how the service layer uses
//! them, and combined into [`FullRepository`] for dependency injection:
//!
//! - [`StudentRepository`]: roster CRUD
//! - [`ExamRepository`]: exam definitions
//! - [`ScheduleRepository`]: schedules, assignments and collision queries
//!
//! Implementations must be `Send + Sync` so one instance can be shared by
//! every request handler behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod error;
pub mod exam;
pub mod schedule;
pub mod student;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use exam::ExamRepository;
pub use schedule::ScheduleRepository;
pub use student::StudentRepository;

/// Everything the services and the HTTP layer need from storage.
pub trait FullRepository: StudentRepository + ExamRepository + ScheduleRepository {}

impl<T> FullRepository for T where T: StudentRepository + ExamRepository + ScheduleRepository {}

/// Transaction boundary for the writes of one planning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// All schedules of a run commit together or not at all.
    #[default]
    Atomic,
    /// Each schedule commits on its own; a failure mid-run keeps the
    /// schedules written before it.
    PerSchedule,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "per_schedule" | "per-schedule" | "per_row" => Ok(Self::PerSchedule),
            _ => Err(format!("Unknown commit mode: {}", s)),
        }
    }
}
