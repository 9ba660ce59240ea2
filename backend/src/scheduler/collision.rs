//! Collision checks over persisted assignments.
//!
//! A collision is a student holding an assignment on a date, optionally
//! ignoring one schedule (the source of a move). Both query forms read the
//! same relation, so `has_collision(s, d, x)` always equals
//! `scheduled_on(d, x).contains(s)`.

use std::collections::HashSet;

use chrono::NaiveDate;
use log::debug;

use crate::db::repository::{RepositoryResult, ScheduleRepository};
use crate::models::ScheduleId;

/// Read-only view of the assignment relation used by planning and moves.
pub struct CollisionChecker<'a, R: ScheduleRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: ScheduleRepository + ?Sized> CollisionChecker<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Whether `reg_no` already sits an exam on `date`.
    ///
    /// Unknown students and empty dates are simply `false`; only store
    /// failures are errors.
    pub async fn has_collision(
        &self,
        reg_no: &str,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<bool> {
        let hit = self.repo.has_assignment_on(reg_no, date, exclude).await?;
        if hit {
            debug!("Collision for {} on {} (excluding {:?})", reg_no, date, exclude);
        }
        Ok(hit)
    }

    /// Every registration number with an assignment on `date`, in one query.
    pub async fn scheduled_on(
        &self,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<HashSet<String>> {
        self.repo.scheduled_students_on(date, exclude).await
    }
}
