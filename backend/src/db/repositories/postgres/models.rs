use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{exams, schedule_students, schedules, students};
use crate::models::{Exam, ExamId, NewExam, Schedule, ScheduleId, Student};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StudentRow {
    pub reg_no: String,
    pub name: String,
    pub branch: String,
    pub semester: i32,
}

impl From<&Student> for StudentRow {
    fn from(s: &Student) -> Self {
        Self {
            reg_no: s.reg_no.clone(),
            name: s.name.clone(),
            branch: s.branch.clone(),
            semester: s.semester,
        }
    }
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student::new(row.reg_no, row.name, row.branch, row.semester)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = exams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExamRow {
    pub exam_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub lab_no: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub examiner_internal: String,
    pub examiner_external: String,
}

impl From<ExamRow> for Exam {
    fn from(row: ExamRow) -> Self {
        Exam {
            exam_id: ExamId::new(row.exam_id),
            subject_code: row.subject_code,
            subject_name: row.subject_name,
            lab_no: row.lab_no,
            date_start: row.date_start,
            date_end: row.date_end,
            examiner_internal: row.examiner_internal,
            examiner_external: row.examiner_external,
        }
    }
}

/// Exam display fields joined onto schedule listings.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = exams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExamLabelRow {
    pub subject_code: String,
    pub subject_name: String,
    pub lab_no: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = exams)]
pub struct NewExamRow<'a> {
    pub subject_code: &'a str,
    pub subject_name: &'a str,
    pub lab_no: &'a str,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub examiner_internal: &'a str,
    pub examiner_external: &'a str,
}

impl<'a> From<&'a NewExam> for NewExamRow<'a> {
    fn from(e: &'a NewExam) -> Self {
        Self {
            subject_code: &e.subject_code,
            subject_name: &e.subject_name,
            lab_no: &e.lab_no,
            date_start: e.date_start,
            date_end: e.date_end,
            examiner_internal: &e.examiner_internal,
            examiner_external: &e.examiner_external,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleRow {
    pub schedule_id: i64,
    pub exam_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
    pub total_students: i32,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Schedule {
            schedule_id: ScheduleId::new(row.schedule_id),
            exam_id: ExamId::new(row.exam_id),
            date: row.date,
            time_slot: row.time_slot,
            total_students: usize::try_from(row.total_students).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedules)]
pub struct NewScheduleRow<'a> {
    pub exam_id: i64,
    pub date: NaiveDate,
    pub time_slot: &'a str,
    pub total_students: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedule_students)]
pub struct NewAssignmentRow<'a> {
    pub schedule_id: i64,
    pub reg_no: &'a str,
}
