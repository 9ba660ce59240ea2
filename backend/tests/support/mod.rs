//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use lab_scheduler::db::repository::{ExamRepository, StudentRepository};
use lab_scheduler::db::LocalRepository;
use lab_scheduler::models::{Exam, NewExam, Student, TimeSlot};
use lab_scheduler::services::GenerateRequest;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn exam_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
}

pub fn next_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

pub fn two_slots() -> Vec<TimeSlot> {
    vec![
        TimeSlot::new("Slot 1", "09:30", "11:30"),
        TimeSlot::new("Slot 2", "13:00", "15:00"),
    ]
}

/// `count` students of one cohort, with reg numbers like `CSE-A5001`.
pub fn cohort(branch: &str, semester: i32, count: usize) -> Vec<Student> {
    (1..=count)
        .map(|i| {
            Student::new(
                format!("{}{}{:03}", branch, semester, i),
                format!("Student {}", i),
                branch,
                semester,
            )
        })
        .collect()
}

pub fn new_exam(subject_code: &str) -> NewExam {
    NewExam {
        subject_code: subject_code.to_string(),
        subject_name: format!("{} Lab", subject_code),
        lab_no: "LAB-1".to_string(),
        date_start: NaiveDate::from_ymd_opt(2025, 10, 27).unwrap(),
        date_end: NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(),
        examiner_internal: "Dr. Rao".to_string(),
        examiner_external: "Dr. Iyer".to_string(),
    }
}

/// A repository holding `roster` and one exam per subject code.
pub async fn seeded(roster: &[Student], subjects: &[&str]) -> (LocalRepository, Vec<Exam>) {
    let repo = LocalRepository::new();
    repo.upsert_students(roster).await.unwrap();
    let mut exams = Vec::new();
    for code in subjects {
        exams.push(repo.insert_exam(&new_exam(code)).await.unwrap());
    }
    (repo, exams)
}

pub fn generate_request(exam: &Exam, date: NaiveDate, cap: i64) -> GenerateRequest {
    GenerateRequest {
        exam_id: exam.exam_id,
        date,
        time_slots: two_slots(),
        max_students_per_batch: cap,
    }
}
