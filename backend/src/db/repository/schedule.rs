//! Schedule and assignment repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;

use super::error::RepositoryResult;
use crate::models::{MoveCounts, NewSchedule, Schedule, ScheduleFilter, ScheduleId, ScheduleView};

/// Repository trait for schedules and their student assignments.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust and allow
/// sharing across threads.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Schedule Writes ====================

    /// Insert one schedule and its assignments in its own transaction.
    ///
    /// # Returns
    /// * `Ok(Schedule)` - The stored schedule with its new id
    /// * `Err(RepositoryError::NotFound)` - If the exam or a student does not exist
    async fn insert_schedule(&self, schedule: &NewSchedule) -> RepositoryResult<Schedule>;

    /// Insert several schedules in a single transaction.
    ///
    /// Either every schedule is stored or none is. Returned schedules are in
    /// input order.
    async fn insert_schedules(&self, schedules: &[NewSchedule])
        -> RepositoryResult<Vec<Schedule>>;

    /// Delete a schedule and its assignments.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the schedule does not exist
    async fn delete_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<()>;

    /// Re-link a student's assignment from one schedule to another and
    /// recompute `total_students` of both from their assignment counts.
    ///
    /// No collision check is made here; callers run the collision checker
    /// first.
    ///
    /// # Returns
    /// * `Ok(MoveCounts)` - Recomputed counts for source and destination
    /// * `Err(RepositoryError::NotFound)` - If either schedule is missing or
    ///   the student is not assigned to the source
    async fn move_assignment(
        &self,
        reg_no: &str,
        from: ScheduleId,
        to: ScheduleId,
    ) -> RepositoryResult<MoveCounts>;

    // ==================== Schedule Reads ====================

    /// Get one schedule record.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the schedule does not exist
    async fn get_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<Schedule>;

    /// List schedules with exam details and students, ordered by
    /// `(date, time_slot, schedule_id)`.
    async fn list_schedules(&self, filter: &ScheduleFilter)
        -> RepositoryResult<Vec<ScheduleView>>;

    /// Whether the student holds an assignment on this schedule.
    async fn is_assigned(&self, reg_no: &str, schedule_id: ScheduleId) -> RepositoryResult<bool>;

    // ==================== Collision Queries ====================

    /// Registration numbers holding an assignment on `date`, ignoring the
    /// schedule `exclude` when given. Spans every exam.
    async fn scheduled_students_on(
        &self,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<HashSet<String>>;

    /// Whether `reg_no` holds an assignment on `date` other than on `exclude`.
    ///
    /// Must agree with [`ScheduleRepository::scheduled_students_on`].
    async fn has_assignment_on(
        &self,
        reg_no: &str,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<bool>;
}
