use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::exam::ExamId;
use super::student::Student;

crate::define_id_type!(i64, ScheduleId);
crate::define_id_type!(i64, AssignmentId);

/// Separator between start and end time in a slot label.
pub const SLOT_LABEL_SEPARATOR: char = '\u{2013}';

/// A named exam session supplied with each generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(default)]
    pub slot_name: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlot {
    pub fn new(
        slot_name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            slot_name: slot_name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Display label stored on the schedule, e.g. `09:30–12:30`.
    pub fn label(&self) -> String {
        format!(
            "{}{}{}",
            self.start_time.trim(),
            SLOT_LABEL_SEPARATOR,
            self.end_time.trim()
        )
    }
}

/// A persisted exam batch on a given date and slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: ScheduleId,
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub time_slot: String,
    /// Always equal to the number of assignments linked to this schedule.
    pub total_students: usize,
}

/// Link between a schedule and one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub assignment_id: AssignmentId,
    pub schedule_id: ScheduleId,
    pub reg_no: String,
}

/// A schedule to be inserted together with its students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub time_slot: String,
    pub reg_nos: Vec<String>,
}

impl NewSchedule {
    pub fn total_students(&self) -> usize {
        self.reg_nos.len()
    }
}

/// A schedule joined with its exam's display fields and its students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub schedule_id: ScheduleId,
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub time_slot: String,
    pub total_students: usize,
    pub subject_code: String,
    pub subject_name: String,
    pub lab_no: String,
    /// Ordered by `(branch, reg_no)`.
    pub students: Vec<Student>,
}

/// Optional filters for listing and exporting schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFilter {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub exam_id: Option<ExamId>,
}

impl ScheduleFilter {
    pub fn matches(&self, schedule: &Schedule) -> bool {
        self.date.is_none_or(|d| d == schedule.date)
            && self.exam_id.is_none_or(|id| id == schedule.exam_id)
    }
}

/// Recomputed student counts after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounts {
    pub from_total_students: usize,
    pub to_total_students: usize,
}

/// Listing order: `(date, time_slot, schedule_id)`.
pub fn sort_views(views: &mut [ScheduleView]) {
    views.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time_slot.cmp(&b.time_slot))
            .then(a.schedule_id.cmp(&b.schedule_id))
    });
}

/// Student order inside a schedule view: `(branch, reg_no)`.
pub fn sort_view_students(students: &mut [Student]) {
    students.sort_by(|a, b| {
        a.branch
            .cmp(&b.branch)
            .then_with(|| a.reg_no.cmp(&b.reg_no))
    });
}
