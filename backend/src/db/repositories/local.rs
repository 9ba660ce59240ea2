//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. Data lives in ordered
//! maps behind a single `parking_lot::RwLock`, so every trait method sees
//! and writes a consistent snapshot.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::db::repository::{
    ErrorContext, ExamRepository, RepositoryError, RepositoryResult, ScheduleRepository,
    StudentRepository,
};
use crate::models::{
    dedup_by_reg_no, sort_roster, sort_view_students, sort_views, AssignmentId, Exam, ExamId,
    MoveCounts, NewExam, NewSchedule, Schedule, ScheduleAssignment, ScheduleFilter, ScheduleId,
    ScheduleView, Student,
};

/// In-memory local repository.
///
/// Cloning shares the underlying data.
///
/// # Example
/// ```
/// use lab_scheduler::db::repositories::LocalRepository;
/// use lab_scheduler::db::repository::StudentRepository;
/// use lab_scheduler::models::Student;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// repo.insert_student(&Student::new("R1", "Asha", "CSE", 5)).await.unwrap();
/// assert_eq!(repo.student_count(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    students: BTreeMap<String, Student>,
    exams: BTreeMap<ExamId, Exam>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    assignments: Vec<ScheduleAssignment>,

    // ID counters
    next_exam_id: i64,
    next_schedule_id: i64,
    next_assignment_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            students: BTreeMap::new(),
            exams: BTreeMap::new(),
            schedules: BTreeMap::new(),
            assignments: Vec::new(),
            next_exam_id: 1,
            next_schedule_id: 1,
            next_assignment_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn assignment_count(&self, schedule_id: ScheduleId) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.schedule_id == schedule_id)
            .count()
    }

    fn recount(&mut self, schedule_id: ScheduleId) -> usize {
        let count = self.assignment_count(schedule_id);
        if let Some(schedule) = self.schedules.get_mut(&schedule_id) {
            schedule.total_students = count;
        }
        count
    }

    fn schedule(&self, schedule_id: ScheduleId, operation: &str) -> RepositoryResult<&Schedule> {
        self.schedules.get(&schedule_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Schedule {} not found", schedule_id),
                ErrorContext::new(operation)
                    .with_entity("schedule")
                    .with_entity_id(schedule_id),
            )
        })
    }

    /// Check references of a schedule before it is written.
    fn check_new_schedule(&self, schedule: &NewSchedule) -> RepositoryResult<()> {
        if !self.exams.contains_key(&schedule.exam_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Exam {} not found", schedule.exam_id),
                ErrorContext::new("insert_schedule")
                    .with_entity("exam")
                    .with_entity_id(schedule.exam_id),
            ));
        }
        if let Some(missing) = schedule
            .reg_nos
            .iter()
            .find(|reg| !self.students.contains_key(*reg))
        {
            return Err(RepositoryError::not_found_with_context(
                format!("Student {} not found", missing),
                ErrorContext::new("insert_schedule")
                    .with_entity("student")
                    .with_entity_id(missing),
            ));
        }
        Ok(())
    }

    fn write_schedule(&mut self, schedule: &NewSchedule) -> Schedule {
        let schedule_id = ScheduleId::new(self.next_schedule_id);
        self.next_schedule_id += 1;

        for reg_no in &schedule.reg_nos {
            let assignment_id = AssignmentId::new(self.next_assignment_id);
            self.next_assignment_id += 1;
            self.assignments.push(ScheduleAssignment {
                assignment_id,
                schedule_id,
                reg_no: reg_no.clone(),
            });
        }

        let stored = Schedule {
            schedule_id,
            exam_id: schedule.exam_id,
            date: schedule.date,
            time_slot: schedule.time_slot.clone(),
            total_students: schedule.total_students(),
        };
        self.schedules.insert(schedule_id, stored.clone());
        stored
    }

    fn remove_schedules(&mut self, doomed: &HashSet<ScheduleId>) {
        self.assignments
            .retain(|a| !doomed.contains(&a.schedule_id));
        self.schedules.retain(|id, _| !doomed.contains(id));
    }

    fn scheduled_on(&self, date: NaiveDate, exclude: Option<ScheduleId>) -> HashSet<String> {
        self.assignments
            .iter()
            .filter(|a| Some(a.schedule_id) != exclude)
            .filter(|a| {
                self.schedules
                    .get(&a.schedule_id)
                    .is_some_and(|s| s.date == date)
            })
            .map(|a| a.reg_no.clone())
            .collect()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of students stored.
    pub fn student_count(&self) -> usize {
        self.data.read().students.len()
    }

    /// Get the number of schedules stored.
    pub fn schedule_count(&self) -> usize {
        self.data.read().schedules.len()
    }

    /// Get the number of assignment rows stored.
    pub fn assignment_count(&self) -> usize {
        self.data.read().assignments.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Student Repository ====================

#[async_trait]
impl StudentRepository for LocalRepository {
    async fn list_students(&self) -> RepositoryResult<Vec<Student>> {
        self.check_health()?;
        let mut students: Vec<Student> = self.data.read().students.values().cloned().collect();
        sort_roster(&mut students);
        Ok(students)
    }

    async fn get_student(&self, reg_no: &str) -> RepositoryResult<Student> {
        self.check_health()?;
        self.data
            .read()
            .students
            .get(reg_no)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Student {} not found", reg_no),
                    ErrorContext::new("get_student")
                        .with_entity("student")
                        .with_entity_id(reg_no),
                )
            })
    }

    async fn insert_student(&self, student: &Student) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.students.contains_key(&student.reg_no) {
            return Err(RepositoryError::conflict_with_context(
                format!("Student {} already exists", student.reg_no),
                ErrorContext::new("insert_student")
                    .with_entity("student")
                    .with_entity_id(&student.reg_no),
            ));
        }
        data.students
            .insert(student.reg_no.clone(), student.clone());
        Ok(())
    }

    async fn upsert_students(&self, students: &[Student]) -> RepositoryResult<usize> {
        self.check_health()?;
        let students = dedup_by_reg_no(students);
        let mut data = self.data.write();
        for student in &students {
            data.students
                .insert(student.reg_no.clone(), student.clone());
        }
        Ok(students.len())
    }

    async fn delete_student(&self, reg_no: &str) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.students.remove(reg_no).is_none() {
            return Err(RepositoryError::not_found_with_context(
                format!("Student {} not found", reg_no),
                ErrorContext::new("delete_student")
                    .with_entity("student")
                    .with_entity_id(reg_no),
            ));
        }

        let affected: HashSet<ScheduleId> = data
            .assignments
            .iter()
            .filter(|a| a.reg_no == reg_no)
            .map(|a| a.schedule_id)
            .collect();
        data.assignments.retain(|a| a.reg_no != reg_no);
        for schedule_id in affected {
            data.recount(schedule_id);
        }
        Ok(())
    }
}

// ==================== Exam Repository ====================

#[async_trait]
impl ExamRepository for LocalRepository {
    async fn list_exams(&self) -> RepositoryResult<Vec<Exam>> {
        self.check_health()?;
        let mut exams: Vec<Exam> = self.data.read().exams.values().cloned().collect();
        exams.sort_by(|a, b| {
            a.date_start
                .cmp(&b.date_start)
                .then(a.exam_id.cmp(&b.exam_id))
        });
        Ok(exams)
    }

    async fn get_exam(&self, exam_id: ExamId) -> RepositoryResult<Exam> {
        self.check_health()?;
        self.data
            .read()
            .exams
            .get(&exam_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Exam {} not found", exam_id),
                    ErrorContext::new("get_exam")
                        .with_entity("exam")
                        .with_entity_id(exam_id),
                )
            })
    }

    async fn insert_exam(&self, exam: &NewExam) -> RepositoryResult<Exam> {
        self.check_health()?;
        let mut data = self.data.write();
        let exam_id = ExamId::new(data.next_exam_id);
        data.next_exam_id += 1;

        let stored = exam.clone().into_exam(exam_id);
        data.exams.insert(exam_id, stored.clone());
        Ok(stored)
    }

    async fn delete_exam(&self, exam_id: ExamId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.exams.remove(&exam_id).is_none() {
            return Err(RepositoryError::not_found_with_context(
                format!("Exam {} not found", exam_id),
                ErrorContext::new("delete_exam")
                    .with_entity("exam")
                    .with_entity_id(exam_id),
            ));
        }

        let doomed: HashSet<ScheduleId> = data
            .schedules
            .values()
            .filter(|s| s.exam_id == exam_id)
            .map(|s| s.schedule_id)
            .collect();
        data.remove_schedules(&doomed);
        Ok(())
    }
}

// ==================== Schedule Repository ====================

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> RepositoryResult<Schedule> {
        self.check_health()?;
        let mut data = self.data.write();
        data.check_new_schedule(schedule)?;
        Ok(data.write_schedule(schedule))
    }

    async fn insert_schedules(
        &self,
        schedules: &[NewSchedule],
    ) -> RepositoryResult<Vec<Schedule>> {
        self.check_health()?;
        let mut data = self.data.write();
        // Check everything first so a bad schedule leaves no partial writes.
        for schedule in schedules {
            data.check_new_schedule(schedule)
                .map_err(|e| e.with_operation("insert_schedules"))?;
        }
        Ok(schedules
            .iter()
            .map(|s| data.write_schedule(s))
            .collect())
    }

    async fn delete_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        data.schedule(schedule_id, "delete_schedule")?;
        data.remove_schedules(&HashSet::from([schedule_id]));
        Ok(())
    }

    async fn move_assignment(
        &self,
        reg_no: &str,
        from: ScheduleId,
        to: ScheduleId,
    ) -> RepositoryResult<MoveCounts> {
        self.check_health()?;
        let mut data = self.data.write();
        data.schedule(to, "move_assignment")?;
        data.schedule(from, "move_assignment")?;

        let assignment = data
            .assignments
            .iter_mut()
            .find(|a| a.schedule_id == from && a.reg_no == reg_no)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Student {} is not assigned to schedule {}", reg_no, from),
                    ErrorContext::new("move_assignment")
                        .with_entity("assignment")
                        .with_entity_id(reg_no),
                )
            })?;
        assignment.schedule_id = to;

        Ok(MoveCounts {
            from_total_students: data.recount(from),
            to_total_students: data.recount(to),
        })
    }

    async fn get_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<Schedule> {
        self.check_health()?;
        let data = self.data.read();
        data.schedule(schedule_id, "get_schedule").cloned()
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> RepositoryResult<Vec<ScheduleView>> {
        self.check_health()?;
        let data = self.data.read();

        let mut views = Vec::new();
        for schedule in data.schedules.values().filter(|s| filter.matches(s)) {
            let Some(exam) = data.exams.get(&schedule.exam_id) else {
                continue;
            };
            let mut students: Vec<Student> = data
                .assignments
                .iter()
                .filter(|a| a.schedule_id == schedule.schedule_id)
                .filter_map(|a| data.students.get(&a.reg_no).cloned())
                .collect();
            sort_view_students(&mut students);

            views.push(ScheduleView {
                schedule_id: schedule.schedule_id,
                exam_id: schedule.exam_id,
                date: schedule.date,
                time_slot: schedule.time_slot.clone(),
                total_students: schedule.total_students,
                subject_code: exam.subject_code.clone(),
                subject_name: exam.subject_name.clone(),
                lab_no: exam.lab_no.clone(),
                students,
            });
        }
        sort_views(&mut views);
        Ok(views)
    }

    async fn is_assigned(&self, reg_no: &str, schedule_id: ScheduleId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .assignments
            .iter()
            .any(|a| a.schedule_id == schedule_id && a.reg_no == reg_no))
    }

    async fn scheduled_students_on(
        &self,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<HashSet<String>> {
        self.check_health()?;
        Ok(self.data.read().scheduled_on(date, exclude))
    }

    async fn has_assignment_on(
        &self,
        reg_no: &str,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<bool> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.assignments.iter().any(|a| {
            a.reg_no == reg_no
                && Some(a.schedule_id) != exclude
                && data
                    .schedules
                    .get(&a.schedule_id)
                    .is_some_and(|s| s.date == date)
        }))
    }
}
