//! Moving one student between schedules.

use log::info;
use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use super::SchedulingContext;
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{MoveCounts, Schedule, ScheduleId};
use crate::scheduler::CollisionChecker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStudentRequest {
    pub student_reg_no: String,
    pub from_schedule_id: ScheduleId,
    pub to_schedule_id: ScheduleId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub reg_no: String,
    pub from_schedule_id: ScheduleId,
    pub to_schedule_id: ScheduleId,
    #[serde(flatten)]
    pub counts: MoveCounts,
}

async fn resolve<R: FullRepository + ?Sized>(
    repo: &R,
    schedule_id: ScheduleId,
    role: &str,
) -> ServiceResult<Schedule> {
    match repo.get_schedule(schedule_id).await {
        Ok(schedule) => Ok(schedule),
        Err(RepositoryError::NotFound { .. }) => Err(ServiceError::NotFound(format!(
            "{} schedule {} not found",
            role, schedule_id
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Move `reg_no` from one schedule to another.
///
/// Rejected with `Conflict` when the student already holds an assignment
/// on the destination's date other than the source schedule. Batch size
/// caps are not enforced here.
///
/// # Returns
/// * `Ok(MoveOutcome)` - With both schedules' recomputed totals
/// * `Err(ServiceError::NotFound)` - Unknown schedule, or the student is not
///   on the source schedule
pub async fn move_student<R: FullRepository + ?Sized>(
    repo: &R,
    ctx: &SchedulingContext,
    request: &MoveStudentRequest,
) -> ServiceResult<MoveOutcome> {
    let reg_no = request.student_reg_no.trim();
    if reg_no.is_empty() {
        return Err(ServiceError::Validation(
            "student_reg_no must not be empty".to_string(),
        ));
    }
    let (from, to) = (request.from_schedule_id, request.to_schedule_id);
    if from == to {
        return Err(ServiceError::Validation(format!(
            "Student {} is already on schedule {}",
            reg_no, from
        )));
    }

    let destination = resolve(repo, to, "Destination").await?;
    let source = resolve(repo, from, "Source").await?;

    let _guard = ctx.locks.lock_many(&[source.date, destination.date]).await;

    if !repo.is_assigned(reg_no, from).await? {
        return Err(ServiceError::NotFound(format!(
            "Student {} is not assigned to schedule {}",
            reg_no, from
        )));
    }

    if CollisionChecker::new(repo)
        .has_collision(reg_no, destination.date, Some(from))
        .await?
    {
        return Err(ServiceError::Conflict(format!(
            "Student {} is already scheduled on {}",
            reg_no, destination.date
        )));
    }

    let counts = repo.move_assignment(reg_no, from, to).await?;
    info!(
        "Moved {} from schedule {} ({}) to {} ({}); totals now {} / {}",
        reg_no,
        from,
        source.date,
        to,
        destination.date,
        counts.from_total_students,
        counts.to_total_students
    );

    Ok(MoveOutcome {
        reg_no: reg_no.to_string(),
        from_schedule_id: from,
        to_schedule_id: to,
        counts,
    })
}
