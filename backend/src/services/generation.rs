//! Schedule generation for one exam on one date.

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use super::SchedulingContext;
use crate::db::repository::{CommitMode, FullRepository};
use crate::models::{ExamId, GroupKey, NewSchedule, Schedule, ScheduleId, Student, TimeSlot};
use crate::scheduler::planner::{batch_size_from, validate_time_slots};
use crate::scheduler::{plan, BatchPlan, CollisionChecker, NoStudentsReason, PlanOutcome, PlanRequest};

/// Input of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    /// Signed so that zero and negative values reach validation instead of
    /// failing deserialization.
    pub max_students_per_batch: i64,
}

/// One persisted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSchedule {
    pub schedule_id: ScheduleId,
    pub batch_number: usize,
    pub time_slot: String,
    pub group: GroupKey,
    pub total_students: usize,
    pub students: Vec<Student>,
}

impl GeneratedSchedule {
    fn from_parts(plan: BatchPlan, stored: Schedule) -> Self {
        Self {
            schedule_id: stored.schedule_id,
            batch_number: plan.batch_number,
            time_slot: stored.time_slot,
            group: plan.group,
            total_students: stored.total_students,
            students: plan.students,
        }
    }
}

/// Result of a generation run. `schedules` is empty exactly when
/// `no_students` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub schedules: Vec<GeneratedSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_students: Option<NoStudentsReason>,
}

impl GenerationOutcome {
    /// Human-readable explanation when nothing was scheduled.
    pub fn message(&self) -> Option<String> {
        self.no_students.map(|reason| reason.message(self.date))
    }
}

/// Plan the batches of `request.exam_id` on `request.date` and persist them.
///
/// Students holding any assignment on the date, for any exam, are skipped.
/// The date stays locked from the already-scheduled read through the last
/// insert.
///
/// # Returns
/// * `Err(ServiceError::Validation)` - Empty or incomplete slots, or a
///   non-positive batch size
/// * `Err(ServiceError::NotFound)` - If the exam does not exist
pub async fn generate_schedules<R: FullRepository + ?Sized>(
    repo: &R,
    ctx: &SchedulingContext,
    request: &GenerateRequest,
) -> ServiceResult<GenerationOutcome> {
    validate_time_slots(&request.time_slots)?;
    let max_batch_size = batch_size_from(request.max_students_per_batch)?;

    let exam = repo.get_exam(request.exam_id).await?;
    if !exam.covers(request.date) {
        warn!(
            "Scheduling exam {} on {} outside its window {}..{}",
            exam.exam_id, request.date, exam.date_start, exam.date_end
        );
    }

    let _guard = ctx.locks.lock(request.date).await;

    let roster = repo.list_students().await?;
    let already_scheduled = CollisionChecker::new(repo)
        .scheduled_on(request.date, None)
        .await?;

    let plan_request = PlanRequest {
        exam_id: request.exam_id,
        date: request.date,
        time_slots: &request.time_slots,
        max_batch_size,
    };
    let plans = match plan(&plan_request, &roster, &already_scheduled)? {
        PlanOutcome::Planned(plans) => plans,
        PlanOutcome::NoStudents(reason) => {
            info!(
                "No batches for exam {} on {}: {:?}",
                request.exam_id, request.date, reason
            );
            return Ok(GenerationOutcome {
                exam_id: request.exam_id,
                date: request.date,
                schedules: Vec::new(),
                no_students: Some(reason),
            });
        }
    };

    let planned_students: usize = plans.iter().map(BatchPlan::total_students).sum();
    info!(
        "Planned {} batches ({} students, {} skipped as already scheduled) for exam {} on {}",
        plans.len(),
        planned_students,
        roster.len().saturating_sub(planned_students),
        request.exam_id,
        request.date
    );

    let new_schedules: Vec<NewSchedule> = plans.iter().map(BatchPlan::to_new_schedule).collect();
    let stored = persist(repo, ctx.commit_mode, &new_schedules).await?;

    let schedules = plans
        .into_iter()
        .zip(stored)
        .map(|(plan, stored)| GeneratedSchedule::from_parts(plan, stored))
        .collect();

    Ok(GenerationOutcome {
        exam_id: request.exam_id,
        date: request.date,
        schedules,
        no_students: None,
    })
}

async fn persist<R: FullRepository + ?Sized>(
    repo: &R,
    mode: CommitMode,
    schedules: &[NewSchedule],
) -> ServiceResult<Vec<Schedule>> {
    match mode {
        CommitMode::Atomic => Ok(repo.insert_schedules(schedules).await?),
        CommitMode::PerSchedule => {
            let mut stored = Vec::with_capacity(schedules.len());
            for schedule in schedules {
                match repo.insert_schedule(schedule).await {
                    Ok(s) => stored.push(s),
                    Err(e) => {
                        warn!(
                            "Schedule insert failed after {} of {} schedules were committed: {}",
                            stored.len(),
                            schedules.len(),
                            e
                        );
                        return Err(ServiceError::from(e));
                    }
                }
            }
            Ok(stored)
        }
    }
}
