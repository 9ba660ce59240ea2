//! Postgres repository implementation using Diesel.
//!
//! Tables: `students`, `exams`, `schedules` and the `schedule_students`
//! assignment link. Foreign keys cascade on delete, so removing an exam or a
//! schedule removes everything hanging off it.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Explicit transactions for every multi-row write
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, ExamRepository, RepositoryError, RepositoryResult, ScheduleRepository,
    StudentRepository,
};
use crate::models::{
    dedup_by_reg_no, sort_view_students, Exam, ExamId, MoveCounts, NewExam, NewSchedule,
    Schedule, ScheduleFilter, ScheduleId, ScheduleView, Student,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Rows per multi-row INSERT, well below the Postgres bind parameter limit.
const INSERT_CHUNK: usize = 1000;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

}

fn db_err(operation: &'static str) -> impl Fn(diesel::result::Error) -> RepositoryError {
    move |e| RepositoryError::from(e).with_operation(operation)
}

fn count_to_i32(count: usize, operation: &'static str) -> RepositoryResult<i32> {
    i32::try_from(count).map_err(|_| {
        RepositoryError::internal_with_context(
            format!("Student count {} does not fit the total_students column", count),
            ErrorContext::new(operation),
        )
    })
}

fn schedule_not_found(schedule_id: i64, operation: &'static str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Schedule {} not found", schedule_id),
        ErrorContext::new(operation)
            .with_entity("schedule")
            .with_entity_id(schedule_id),
    )
}

/// Recompute `total_students` of one schedule from its assignment rows.
fn recount(conn: &mut PgConnection, schedule_id: i64) -> RepositoryResult<usize> {
    let count: i64 = schedule_students::table
        .filter(schedule_students::schedule_id.eq(schedule_id))
        .count()
        .get_result(conn)
        .map_err(db_err("recount"))?;
    let count = usize::try_from(count).unwrap_or(0);

    diesel::update(schedules::table.find(schedule_id))
        .set(schedules::total_students.eq(count_to_i32(count, "recount")?))
        .execute(conn)
        .map_err(db_err("recount"))?;
    Ok(count)
}

/// Insert one schedule with its assignments on an open connection.
///
/// References are checked up front so a missing exam or student yields a
/// NotFound naming the offender rather than a bare foreign key violation.
fn write_schedule(conn: &mut PgConnection, schedule: &NewSchedule) -> RepositoryResult<Schedule> {
    let exam_exists: bool = diesel::select(diesel::dsl::exists(
        exams::table.find(schedule.exam_id.value()),
    ))
    .get_result(conn)
    .map_err(db_err("insert_schedule"))?;
    if !exam_exists {
        return Err(RepositoryError::not_found_with_context(
            format!("Exam {} not found", schedule.exam_id),
            ErrorContext::new("insert_schedule")
                .with_entity("exam")
                .with_entity_id(schedule.exam_id),
        ));
    }

    let known: HashSet<String> = students::table
        .filter(students::reg_no.eq_any(&schedule.reg_nos))
        .select(students::reg_no)
        .load::<String>(conn)
        .map_err(db_err("insert_schedule"))?
        .into_iter()
        .collect();
    if let Some(missing) = schedule.reg_nos.iter().find(|r| !known.contains(*r)) {
        return Err(RepositoryError::not_found_with_context(
            format!("Student {} not found", missing),
            ErrorContext::new("insert_schedule")
                .with_entity("student")
                .with_entity_id(missing),
        ));
    }

    let inserted: ScheduleRow = diesel::insert_into(schedules::table)
        .values(&NewScheduleRow {
            exam_id: schedule.exam_id.value(),
            date: schedule.date,
            time_slot: &schedule.time_slot,
            total_students: count_to_i32(schedule.total_students(), "insert_schedule")?,
        })
        .returning(ScheduleRow::as_returning())
        .get_result(conn)
        .map_err(db_err("insert_schedule"))?;

    let rows: Vec<NewAssignmentRow<'_>> = schedule
        .reg_nos
        .iter()
        .map(|reg_no| NewAssignmentRow {
            schedule_id: inserted.schedule_id,
            reg_no,
        })
        .collect();
    for chunk in rows.chunks(INSERT_CHUNK) {
        diesel::insert_into(schedule_students::table)
            .values(chunk)
            .execute(conn)
            .map_err(db_err("insert_schedule"))?;
    }

    Ok(inserted.into())
}

// ==================== Student Repository ====================

#[async_trait]
impl StudentRepository for PostgresRepository {
    async fn list_students(&self) -> RepositoryResult<Vec<Student>> {
        self.with_conn(|conn| {
            let rows = students::table
                .order((
                    students::branch.asc(),
                    students::semester.asc(),
                    students::reg_no.asc(),
                ))
                .select(StudentRow::as_select())
                .load::<StudentRow>(conn)
                .map_err(db_err("list_students"))?;
            Ok(rows.into_iter().map(Student::from).collect())
        })
        .await
    }

    async fn get_student(&self, reg_no: &str) -> RepositoryResult<Student> {
        let reg_no = reg_no.to_string();
        self.with_conn(move |conn| {
            students::table
                .find(&reg_no)
                .select(StudentRow::as_select())
                .first::<StudentRow>(conn)
                .optional()
                .map_err(db_err("get_student"))?
                .map(Student::from)
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Student {} not found", reg_no),
                        ErrorContext::new("get_student")
                            .with_entity("student")
                            .with_entity_id(&reg_no),
                    )
                })
        })
        .await
    }

    async fn insert_student(&self, student: &Student) -> RepositoryResult<()> {
        let row = StudentRow::from(student);
        self.with_conn(move |conn| {
            diesel::insert_into(students::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(db_err("insert_student"))
        })
        .await
    }

    async fn upsert_students(&self, students: &[Student]) -> RepositoryResult<usize> {
        // One statement may not upsert the same key twice.
        let rows: Vec<StudentRow> = dedup_by_reg_no(students)
            .iter()
            .map(StudentRow::from)
            .collect();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK) {
                    written += diesel::insert_into(students::table)
                        .values(chunk)
                        .on_conflict(students::reg_no)
                        .do_update()
                        .set((
                            students::name.eq(excluded(students::name)),
                            students::branch.eq(excluded(students::branch)),
                            students::semester.eq(excluded(students::semester)),
                        ))
                        .execute(tx)
                        .map_err(db_err("upsert_students"))?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn delete_student(&self, reg_no: &str) -> RepositoryResult<()> {
        let reg_no = reg_no.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let affected: Vec<i64> = schedule_students::table
                    .filter(schedule_students::reg_no.eq(&reg_no))
                    .select(schedule_students::schedule_id)
                    .distinct()
                    .load(tx)
                    .map_err(db_err("delete_student"))?;

                // Assignment rows go with the student via ON DELETE CASCADE.
                let deleted = diesel::delete(students::table.find(&reg_no))
                    .execute(tx)
                    .map_err(db_err("delete_student"))?;
                if deleted == 0 {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Student {} not found", reg_no),
                        ErrorContext::new("delete_student")
                            .with_entity("student")
                            .with_entity_id(&reg_no),
                    ));
                }

                for schedule_id in affected {
                    recount(tx, schedule_id)?;
                }
                Ok(())
            })
        })
        .await
    }
}

// ==================== Exam Repository ====================

#[async_trait]
impl ExamRepository for PostgresRepository {
    async fn list_exams(&self) -> RepositoryResult<Vec<Exam>> {
        self.with_conn(|conn| {
            let rows = exams::table
                .order((exams::date_start.asc(), exams::exam_id.asc()))
                .select(ExamRow::as_select())
                .load::<ExamRow>(conn)
                .map_err(db_err("list_exams"))?;
            Ok(rows.into_iter().map(Exam::from).collect())
        })
        .await
    }

    async fn get_exam(&self, exam_id: ExamId) -> RepositoryResult<Exam> {
        self.with_conn(move |conn| {
            exams::table
                .find(exam_id.value())
                .select(ExamRow::as_select())
                .first::<ExamRow>(conn)
                .optional()
                .map_err(db_err("get_exam"))?
                .map(Exam::from)
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Exam {} not found", exam_id),
                        ErrorContext::new("get_exam")
                            .with_entity("exam")
                            .with_entity_id(exam_id),
                    )
                })
        })
        .await
    }

    async fn insert_exam(&self, exam: &NewExam) -> RepositoryResult<Exam> {
        let exam = exam.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(exams::table)
                .values(&NewExamRow::from(&exam))
                .returning(ExamRow::as_returning())
                .get_result::<ExamRow>(conn)
                .map(Exam::from)
                .map_err(db_err("insert_exam"))
        })
        .await
    }

    async fn delete_exam(&self, exam_id: ExamId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            // Schedules and their assignments cascade.
            let deleted = diesel::delete(exams::table.find(exam_id.value()))
                .execute(conn)
                .map_err(db_err("delete_exam"))?;
            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    format!("Exam {} not found", exam_id),
                    ErrorContext::new("delete_exam")
                        .with_entity("exam")
                        .with_entity_id(exam_id),
                ));
            }
            Ok(())
        })
        .await
    }
}

// ==================== Schedule Repository ====================

#[async_trait]
impl ScheduleRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(db_err("health_check"))
        })
        .await
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> RepositoryResult<Schedule> {
        let schedule = schedule.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| write_schedule(tx, &schedule))
        })
        .await
    }

    async fn insert_schedules(
        &self,
        schedules: &[NewSchedule],
    ) -> RepositoryResult<Vec<Schedule>> {
        let schedules = schedules.to_vec();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                schedules
                    .iter()
                    .map(|s| write_schedule(tx, s))
                    .collect::<RepositoryResult<Vec<_>>>()
            })
            .map_err(|e| e.with_operation("insert_schedules"))
        })
        .await
    }

    async fn delete_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(schedules::table.find(schedule_id.value()))
                .execute(conn)
                .map_err(db_err("delete_schedule"))?;
            if deleted == 0 {
                return Err(schedule_not_found(schedule_id.value(), "delete_schedule"));
            }
            Ok(())
        })
        .await
    }

    async fn move_assignment(
        &self,
        reg_no: &str,
        from: ScheduleId,
        to: ScheduleId,
    ) -> RepositoryResult<MoveCounts> {
        let reg_no = reg_no.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                for id in [to.value(), from.value()] {
                    let exists: bool =
                        diesel::select(diesel::dsl::exists(schedules::table.find(id)))
                            .get_result(tx)
                            .map_err(db_err("move_assignment"))?;
                    if !exists {
                        return Err(schedule_not_found(id, "move_assignment"));
                    }
                }

                let moved = diesel::update(
                    schedule_students::table
                        .filter(schedule_students::schedule_id.eq(from.value()))
                        .filter(schedule_students::reg_no.eq(&reg_no)),
                )
                .set(schedule_students::schedule_id.eq(to.value()))
                .execute(tx)
                .map_err(db_err("move_assignment"))?;
                if moved == 0 {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Student {} is not assigned to schedule {}", reg_no, from),
                        ErrorContext::new("move_assignment")
                            .with_entity("assignment")
                            .with_entity_id(&reg_no),
                    ));
                }

                Ok(MoveCounts {
                    from_total_students: recount(tx, from.value())?,
                    to_total_students: recount(tx, to.value())?,
                })
            })
        })
        .await
    }

    async fn get_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<Schedule> {
        self.with_conn(move |conn| {
            schedules::table
                .find(schedule_id.value())
                .select(ScheduleRow::as_select())
                .first::<ScheduleRow>(conn)
                .optional()
                .map_err(db_err("get_schedule"))?
                .map(Schedule::from)
                .ok_or_else(|| schedule_not_found(schedule_id.value(), "get_schedule"))
        })
        .await
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> RepositoryResult<Vec<ScheduleView>> {
        let filter = *filter;
        self.with_conn(move |conn| {
            let mut query = schedules::table
                .inner_join(exams::table)
                .select((ScheduleRow::as_select(), ExamLabelRow::as_select()))
                .order((
                    schedules::date.asc(),
                    schedules::time_slot.asc(),
                    schedules::schedule_id.asc(),
                ))
                .into_boxed();
            if let Some(date) = filter.date {
                query = query.filter(schedules::date.eq(date));
            }
            if let Some(exam_id) = filter.exam_id {
                query = query.filter(schedules::exam_id.eq(exam_id.value()));
            }
            let rows: Vec<(ScheduleRow, ExamLabelRow)> =
                query.load(conn).map_err(db_err("list_schedules"))?;

            let ids: Vec<i64> = rows.iter().map(|(s, _)| s.schedule_id).collect();
            let members: Vec<(i64, StudentRow)> = schedule_students::table
                .inner_join(students::table)
                .filter(schedule_students::schedule_id.eq_any(&ids))
                .select((schedule_students::schedule_id, StudentRow::as_select()))
                .load(conn)
                .map_err(db_err("list_schedules"))?;

            let mut by_schedule: HashMap<i64, Vec<Student>> = HashMap::new();
            for (schedule_id, row) in members {
                by_schedule
                    .entry(schedule_id)
                    .or_default()
                    .push(row.into());
            }

            Ok(rows
                .into_iter()
                .map(|(row, label)| {
                    let mut students = by_schedule.remove(&row.schedule_id).unwrap_or_default();
                    sort_view_students(&mut students);
                    let schedule = Schedule::from(row);
                    ScheduleView {
                        schedule_id: schedule.schedule_id,
                        exam_id: schedule.exam_id,
                        date: schedule.date,
                        time_slot: schedule.time_slot,
                        total_students: schedule.total_students,
                        subject_code: label.subject_code,
                        subject_name: label.subject_name,
                        lab_no: label.lab_no,
                        students,
                    }
                })
                .collect())
        })
        .await
    }

    async fn is_assigned(&self, reg_no: &str, schedule_id: ScheduleId) -> RepositoryResult<bool> {
        let reg_no = reg_no.to_string();
        self.with_conn(move |conn| {
            diesel::select(diesel::dsl::exists(
                schedule_students::table
                    .filter(schedule_students::schedule_id.eq(schedule_id.value()))
                    .filter(schedule_students::reg_no.eq(&reg_no)),
            ))
            .get_result(conn)
            .map_err(db_err("is_assigned"))
        })
        .await
    }

    async fn scheduled_students_on(
        &self,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<HashSet<String>> {
        self.with_conn(move |conn| {
            let mut query = schedule_students::table
                .inner_join(schedules::table)
                .filter(schedules::date.eq(date))
                .select(schedule_students::reg_no)
                .distinct()
                .into_boxed();
            if let Some(excluded_id) = exclude {
                query = query.filter(schedule_students::schedule_id.ne(excluded_id.value()));
            }
            let reg_nos: Vec<String> = query.load(conn).map_err(db_err("scheduled_students_on"))?;
            Ok(reg_nos.into_iter().collect())
        })
        .await
    }

    async fn has_assignment_on(
        &self,
        reg_no: &str,
        date: NaiveDate,
        exclude: Option<ScheduleId>,
    ) -> RepositoryResult<bool> {
        let reg_no = reg_no.to_string();
        self.with_conn(move |conn| {
            let mut query = schedule_students::table
                .inner_join(schedules::table)
                .filter(schedules::date.eq(date))
                .filter(schedule_students::reg_no.eq(reg_no.clone()))
                .select(schedule_students::assignment_id)
                .into_boxed();
            if let Some(excluded_id) = exclude {
                query = query.filter(schedule_students::schedule_id.ne(excluded_id.value()));
            }
            let hit: Option<i64> = query
                .first(conn)
                .optional()
                .map_err(db_err("has_assignment_on"))?;
            Ok(hit.is_some())
        })
        .await
    }
}
