//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Upper bound for roster uploads.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Roster
        .route(
            "/students",
            get(handlers::list_students).post(handlers::add_student),
        )
        .route("/students/upload", post(handlers::upload_students))
        .route("/students/{reg_no}", delete(handlers::delete_student))
        // Exams
        .route("/exams", get(handlers::list_exams).post(handlers::add_exam))
        .route("/exams/upload", post(handlers::upload_exams))
        .route("/exams/{exam_id}", delete(handlers::delete_exam))
        // Schedules
        .route("/schedules", get(handlers::list_schedules))
        .route("/schedules/generate", post(handlers::generate_schedules))
        .route("/schedules/move-student", put(handlers::move_student))
        .route("/schedules/{schedule_id}", delete(handlers::delete_schedule))
        // Export
        .route("/export/csv", get(handlers::export_csv))
        .route("/export/print", get(handlers::export_print));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
