//! High-level database service layer.
//!
//! Repository-agnostic roster, exam and schedule operations. These functions
//! hold the checks that must be the same for every storage backend (field
//! validation, logging of destructive operations) and pass everything else
//! through to the repository.
//!
//! Planning and moves live in [`crate::services`]; they need the collision
//! checker and the per-date locks on top of these calls.
//!
//! # Usage
//!
//! ```no_run
//! use lab_scheduler::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let students = services::list_students(&repo).await?;
//!     println!("Found {} students", students.len());
//!     Ok(())
//! }
//! ```

use log::{info, warn};

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{Exam, ExamId, NewExam, ScheduleFilter, ScheduleId, ScheduleView, Student};

// ==================== Health & Connection ====================

/// Check if the database connection is healthy.
///
/// This is a simple pass-through to the repository's health check.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Students ====================

/// List the roster in `(branch, semester, reg_no)` order.
pub async fn list_students<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Student>> {
    repo.list_students().await
}

/// Add one student.
///
/// # Returns
/// * `Err(RepositoryError::ValidationError)` - If a required field is blank
/// * `Err(RepositoryError::ConflictError)` - If the registration number exists
pub async fn add_student<R: FullRepository + ?Sized>(
    repo: &R,
    student: &Student,
) -> RepositoryResult<()> {
    student.validate().map_err(|msg| {
        RepositoryError::ValidationError {
            message: msg,
            context: ErrorContext::new("add_student").with_entity("student"),
        }
    })?;
    repo.insert_student(student).await?;
    info!("Added student {} ({})", student.reg_no, student.group_key());
    Ok(())
}

/// Delete a student and their assignments.
pub async fn delete_student<R: FullRepository + ?Sized>(
    repo: &R,
    reg_no: &str,
) -> RepositoryResult<()> {
    repo.delete_student(reg_no).await?;
    warn!("Deleted student {} and their assignments", reg_no);
    Ok(())
}

// ==================== Exams ====================

/// List exams in `(date_start, exam_id)` order.
pub async fn list_exams<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Exam>> {
    repo.list_exams().await
}

/// Validate and store an exam.
///
/// # Returns
/// * `Ok(Exam)` - The stored exam with its id
/// * `Err(RepositoryError::ValidationError)` - If a text field is blank or the
///   date range is inverted
pub async fn add_exam<R: FullRepository + ?Sized>(
    repo: &R,
    exam: &NewExam,
) -> RepositoryResult<Exam> {
    exam.validate().map_err(|msg| RepositoryError::ValidationError {
        message: msg,
        context: ErrorContext::new("add_exam").with_entity("exam"),
    })?;
    let stored = repo.insert_exam(exam).await?;
    info!(
        "Added exam {} ({} {}) for {}..{}",
        stored.exam_id, stored.subject_code, stored.lab_no, stored.date_start, stored.date_end
    );
    Ok(stored)
}

/// Delete an exam with its schedules and assignments.
pub async fn delete_exam<R: FullRepository + ?Sized>(
    repo: &R,
    exam_id: ExamId,
) -> RepositoryResult<()> {
    repo.delete_exam(exam_id).await?;
    warn!("Deleted exam {} with its schedules", exam_id);
    Ok(())
}

// ==================== Schedules ====================

/// List schedule views matching `filter`.
pub async fn list_schedules<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &ScheduleFilter,
) -> RepositoryResult<Vec<ScheduleView>> {
    repo.list_schedules(filter).await
}

/// Delete a schedule and its assignments. The students become schedulable
/// again on that date.
pub async fn delete_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    schedule_id: ScheduleId,
) -> RepositoryResult<()> {
    repo.delete_schedule(schedule_id).await?;
    warn!("Deleted schedule {}", schedule_id);
    Ok(())
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
