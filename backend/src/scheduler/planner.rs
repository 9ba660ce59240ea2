//! Batch planner.
//!
//! Turns a roster into exam batches for one exam on one date:
//!
//! 1. Sort the roster by `(branch, semester, reg_no)` and group it by
//!    `(branch, semester)`. Groups keep the order they are first seen in.
//! 2. Drop students that already hold an assignment on the date.
//! 3. Slice every group into consecutive batches of at most
//!    `max_batch_size` students.
//! 4. Hand out time slots round robin: batch `i` (counted across all
//!    groups) gets slot `i mod n`, wrapping past the last slot.
//!
//! The planner is pure. Identifiers are allocated by the repository when the
//! plans are persisted.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{sort_roster, ExamId, GroupKey, NewSchedule, Student, TimeSlot};

/// Input validation failures. These never depend on the roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("at least one time slot is required")]
    NoTimeSlots,

    #[error("max_students_per_batch must be a positive integer, got {0}")]
    InvalidBatchSize(i64),

    #[error("time slot {index} ('{slot_name}') needs both a start and an end time")]
    IncompleteTimeSlot { index: usize, slot_name: String },
}

/// Parameters of one planning run.
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub time_slots: &'a [TimeSlot],
    pub max_batch_size: usize,
}

/// A size-bounded slice of one cohort, before it has a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based, counted across all groups
    pub batch_number: usize,
    pub group: GroupKey,
    pub students: Vec<Student>,
}

/// A batch with its slot resolved, ready to be persisted as a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub batch_number: usize,
    pub exam_id: ExamId,
    pub date: NaiveDate,
    /// Index into the request's slot list
    pub slot_index: usize,
    pub time_slot: String,
    pub group: GroupKey,
    pub students: Vec<Student>,
}

impl BatchPlan {
    pub fn total_students(&self) -> usize {
        self.students.len()
    }

    pub fn to_new_schedule(&self) -> NewSchedule {
        NewSchedule {
            exam_id: self.exam_id,
            date: self.date,
            time_slot: self.time_slot.clone(),
            reg_nos: self.students.iter().map(|s| s.reg_no.clone()).collect(),
        }
    }
}

/// Why a run produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoStudentsReason {
    /// The roster is empty.
    EmptyRoster,
    /// Every student already holds an assignment on the date.
    AllAlreadyScheduled,
}

impl NoStudentsReason {
    pub fn message(&self, date: NaiveDate) -> String {
        match self {
            NoStudentsReason::EmptyRoster => "No students found".to_string(),
            NoStudentsReason::AllAlreadyScheduled => {
                format!("All students are already scheduled on {}", date)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Planned(Vec<BatchPlan>),
    NoStudents(NoStudentsReason),
}

impl PlanOutcome {
    pub fn plans(&self) -> &[BatchPlan] {
        match self {
            PlanOutcome::Planned(plans) => plans,
            PlanOutcome::NoStudents(_) => &[],
        }
    }
}

/// Check the slot list on its own.
pub fn validate_time_slots(time_slots: &[TimeSlot]) -> Result<(), PlanError> {
    if time_slots.is_empty() {
        return Err(PlanError::NoTimeSlots);
    }
    for (index, slot) in time_slots.iter().enumerate() {
        if slot.start_time.trim().is_empty() || slot.end_time.trim().is_empty() {
            return Err(PlanError::IncompleteTimeSlot {
                index,
                slot_name: slot.slot_name.clone(),
            });
        }
    }
    Ok(())
}

/// Convert a requested batch size, rejecting zero and negatives.
pub fn batch_size_from(requested: i64) -> Result<usize, PlanError> {
    match usize::try_from(requested) {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(PlanError::InvalidBatchSize(requested)),
    }
}

/// Group a roster by `(branch, semester)`.
///
/// Students inside a group are in `(branch, semester, reg_no)` order and the
/// groups themselves are in first-seen order of that same sort.
pub fn group_students(roster: &[Student]) -> Vec<(GroupKey, Vec<Student>)> {
    let mut sorted = roster.to_vec();
    sort_roster(&mut sorted);

    let mut groups: Vec<(GroupKey, Vec<Student>)> = Vec::new();
    for student in sorted {
        let key = student.group_key();
        match groups.last_mut() {
            Some((last, members)) if *last == key => members.push(student),
            _ => groups.push((key, vec![student])),
        }
    }
    groups
}

/// Filter out already-scheduled students and slice each group into batches.
pub fn carve_batches(
    groups: Vec<(GroupKey, Vec<Student>)>,
    already_scheduled: &HashSet<String>,
    max_batch_size: usize,
) -> Vec<Batch> {
    let mut batches = Vec::new();
    for (group, members) in groups {
        let available: Vec<Student> = members
            .into_iter()
            .filter(|s| !already_scheduled.contains(&s.reg_no))
            .collect();

        for chunk in available.chunks(max_batch_size.max(1)) {
            batches.push(Batch {
                batch_number: batches.len() + 1,
                group: group.clone(),
                students: chunk.to_vec(),
            });
        }
    }
    batches
}

/// Round-robin slot for the `batch_index`-th batch (0-based).
pub fn slot_index(batch_index: usize, slot_count: usize) -> usize {
    batch_index % slot_count
}

/// Run the planner.
///
/// Validation happens before the roster is looked at, so an empty slot list
/// is rejected even when there is nobody to schedule.
pub fn plan(
    request: &PlanRequest<'_>,
    roster: &[Student],
    already_scheduled: &HashSet<String>,
) -> Result<PlanOutcome, PlanError> {
    validate_time_slots(request.time_slots)?;
    if request.max_batch_size == 0 {
        return Err(PlanError::InvalidBatchSize(0));
    }

    if roster.is_empty() {
        return Ok(PlanOutcome::NoStudents(NoStudentsReason::EmptyRoster));
    }

    let batches = carve_batches(
        group_students(roster),
        already_scheduled,
        request.max_batch_size,
    );
    if batches.is_empty() {
        return Ok(PlanOutcome::NoStudents(
            NoStudentsReason::AllAlreadyScheduled,
        ));
    }

    let labels: Vec<String> = request.time_slots.iter().map(TimeSlot::label).collect();
    let plans = batches
        .into_iter()
        .enumerate()
        .map(|(i, batch)| {
            let slot = slot_index(i, labels.len());
            BatchPlan {
                batch_number: batch.batch_number,
                exam_id: request.exam_id,
                date: request.date,
                slot_index: slot,
                time_slot: labels[slot].clone(),
                group: batch.group,
                students: batch.students,
            }
        })
        .collect();

    Ok(PlanOutcome::Planned(plans))
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
