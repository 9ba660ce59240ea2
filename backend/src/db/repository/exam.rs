//! Exam definition repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Exam, ExamId, NewExam};

/// Repository trait for exam definitions.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// List exams ordered by `(date_start, exam_id)`.
    async fn list_exams(&self) -> RepositoryResult<Vec<Exam>>;

    /// Get one exam.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the exam does not exist
    async fn get_exam(&self, exam_id: ExamId) -> RepositoryResult<Exam>;

    /// Store a new exam and return it with its assigned id.
    async fn insert_exam(&self, exam: &NewExam) -> RepositoryResult<Exam>;

    /// Delete an exam, cascading to its schedules and their assignments.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the exam does not exist
    async fn delete_exam(&self, exam_id: ExamId) -> RepositoryResult<()>;
}
