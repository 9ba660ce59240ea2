//! Scheduling services.
//!
//! These sit between the HTTP layer and the repository and own the
//! invariants that span several store calls:
//!
//! - [`generation`]: plan and persist the batches of one exam on one date
//! - [`student_move`]: move one student between schedules without creating
//!   a same-date collision
//!
//! Both run inside the per-date critical sections of [`SchedulingContext`].

pub mod error;
pub mod generation;
pub mod student_move;

pub use error::{ServiceError, ServiceResult};
pub use generation::{generate_schedules, GenerateRequest, GeneratedSchedule, GenerationOutcome};
pub use student_move::{move_student, MoveOutcome, MoveStudentRequest};

use crate::db::repository::CommitMode;
use crate::scheduler::DateLocks;

/// Process-wide scheduling state shared by every request.
#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    pub commit_mode: CommitMode,
    pub locks: DateLocks,
}

impl SchedulingContext {
    pub fn new(commit_mode: CommitMode) -> Self {
        Self {
            commit_mode,
            locks: DateLocks::new(),
        }
    }
}
