//! Roster repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::Student;

/// Repository trait for the student roster.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// List every student, ordered by `(branch, semester, reg_no)`.
    async fn list_students(&self) -> RepositoryResult<Vec<Student>>;

    /// Get one student.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no student has this registration number
    async fn get_student(&self, reg_no: &str) -> RepositoryResult<Student>;

    /// Insert a new student.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If the registration number is taken
    async fn insert_student(&self, student: &Student) -> RepositoryResult<()>;

    /// Insert or replace students keyed by registration number.
    ///
    /// Existing assignments of replaced students are kept. When `students`
    /// repeats a registration number the last entry wins.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of distinct students written
    async fn upsert_students(&self, students: &[Student]) -> RepositoryResult<usize>;

    /// Delete a student together with their schedule assignments.
    ///
    /// The `total_students` of every schedule that lost an assignment is
    /// recomputed.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the student does not exist
    async fn delete_student(&self, reg_no: &str) -> RepositoryResult<()>;
}
