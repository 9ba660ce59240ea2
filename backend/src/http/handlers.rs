//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{
    CreateExamResponse, GenerateRequest, GenerateResponse, HealthResponse, ImportResponse,
    MessageResponse, MoveResponse, MoveStudentRequest, NewExam, ScheduleFilter, ScheduleView,
    Student,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::export::{render_printable, schedules_to_csv};
use crate::models::{Exam, ExamId, ScheduleId};
use crate::roster;
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Multipart field carrying uploaded CSV files.
const UPLOAD_FIELD: &str = "file";

/// Pull the `file` field out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Could not read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e.message()),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Students
// =============================================================================

/// GET /api/students
pub async fn list_students(State(state): State<AppState>) -> HandlerResult<Vec<Student>> {
    Ok(Json(
        db_services::list_students(state.repository.as_ref()).await?,
    ))
}

/// POST /api/students
pub async fn add_student(
    State(state): State<AppState>,
    Json(student): Json<Student>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    db_services::add_student(state.repository.as_ref(), &student).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Student {} added",
            student.reg_no
        ))),
    ))
}

/// POST /api/students/upload
///
/// Multipart CSV with columns `reg_no, name, branch, semester`.
pub async fn upload_students(
    State(state): State<AppState>,
    multipart: Multipart,
) -> HandlerResult<ImportResponse> {
    let bytes = read_upload(multipart).await?;
    let summary = roster::import_students(state.repository.as_ref(), &bytes).await?;
    Ok(Json(ImportResponse::new("students", summary)))
}

/// DELETE /api/students/{reg_no}
pub async fn delete_student(
    State(state): State<AppState>,
    Path(reg_no): Path<String>,
) -> HandlerResult<MessageResponse> {
    db_services::delete_student(state.repository.as_ref(), &reg_no).await?;
    Ok(Json(MessageResponse::new(format!(
        "Student {} deleted",
        reg_no
    ))))
}

// =============================================================================
// Exams
// =============================================================================

/// GET /api/exams
pub async fn list_exams(State(state): State<AppState>) -> HandlerResult<Vec<Exam>> {
    Ok(Json(db_services::list_exams(state.repository.as_ref()).await?))
}

/// POST /api/exams
pub async fn add_exam(
    State(state): State<AppState>,
    Json(exam): Json<NewExam>,
) -> Result<(StatusCode, Json<CreateExamResponse>), AppError> {
    let stored = db_services::add_exam(state.repository.as_ref(), &exam).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateExamResponse {
            message: "Exam added".to_string(),
            exam_id: stored.exam_id,
        }),
    ))
}

/// POST /api/exams/upload
pub async fn upload_exams(
    State(state): State<AppState>,
    multipart: Multipart,
) -> HandlerResult<ImportResponse> {
    let bytes = read_upload(multipart).await?;
    let summary = roster::import_exams(state.repository.as_ref(), &bytes).await?;
    Ok(Json(ImportResponse::new("exams", summary)))
}

/// DELETE /api/exams/{exam_id}
pub async fn delete_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let exam_id = ExamId::new(exam_id);
    db_services::delete_exam(state.repository.as_ref(), exam_id).await?;
    Ok(Json(MessageResponse::new(format!("Exam {} deleted", exam_id))))
}

// =============================================================================
// Schedules
// =============================================================================

/// POST /api/schedules/generate
///
/// A run that finds nobody to schedule is still a 200, with an empty
/// `schedules` list and a `message`.
pub async fn generate_schedules(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> HandlerResult<GenerateResponse> {
    let outcome =
        services::generate_schedules(state.repository.as_ref(), &state.scheduling, &request)
            .await?;
    Ok(Json(outcome.into()))
}

/// GET /api/schedules?date=YYYY-MM-DD&exam_id=N
pub async fn list_schedules(
    State(state): State<AppState>,
    Query(filter): Query<ScheduleFilter>,
) -> HandlerResult<Vec<ScheduleView>> {
    Ok(Json(
        db_services::list_schedules(state.repository.as_ref(), &filter).await?,
    ))
}

/// PUT /api/schedules/move-student
pub async fn move_student(
    State(state): State<AppState>,
    Json(request): Json<MoveStudentRequest>,
) -> HandlerResult<MoveResponse> {
    let outcome =
        services::move_student(state.repository.as_ref(), &state.scheduling, &request).await?;
    Ok(Json(outcome.into()))
}

/// DELETE /api/schedules/{schedule_id}
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let schedule_id = ScheduleId::new(schedule_id);
    db_services::delete_schedule(state.repository.as_ref(), schedule_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Schedule {} deleted",
        schedule_id
    ))))
}

// =============================================================================
// Export
// =============================================================================

/// GET /api/export/csv?date&exam_id
pub async fn export_csv(
    State(state): State<AppState>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Response, AppError> {
    let views = db_services::list_schedules(state.repository.as_ref(), &filter).await?;
    let body = schedules_to_csv(&views)?;
    Ok(attachment("text/csv; charset=utf-8", "schedule.csv", body))
}

/// GET /api/export/print?date&exam_id
pub async fn export_print(
    State(state): State<AppState>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Response, AppError> {
    let views = db_services::list_schedules(state.repository.as_ref(), &filter).await?;
    let body = render_printable(&views, state.export.rows_per_page);
    Ok(attachment(
        "text/plain; charset=utf-8",
        "schedule.txt",
        body.into_bytes(),
    ))
}
