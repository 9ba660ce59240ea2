//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies for generation and moves are the service types
//! themselves; the wrappers here only shape responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::models::{NewExam, ScheduleFilter, ScheduleView, Student};
pub use crate::roster::ImportSummary;
pub use crate::services::{GenerateRequest, GeneratedSchedule, MoveStudentRequest};

use crate::models::ExamId;
use crate::services::{GenerationOutcome, MoveOutcome};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Repository status: "connected", "disconnected" or "error: ..."
    pub database: String,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExamResponse {
    pub message: String,
    pub exam_id: ExamId,
}

/// Response of `POST /api/schedules/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub exam_id: ExamId,
    pub date: NaiveDate,
    pub schedules: Vec<GeneratedSchedule>,
    /// Set only when nobody was scheduled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        let message = outcome.message();
        Self {
            exam_id: outcome.exam_id,
            date: outcome.date,
            schedules: outcome.schedules,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub message: String,
    pub from_total_students: usize,
    pub to_total_students: usize,
}

impl From<MoveOutcome> for MoveResponse {
    fn from(outcome: MoveOutcome) -> Self {
        Self {
            message: format!(
                "Student {} moved from schedule {} to schedule {}",
                outcome.reg_no, outcome.from_schedule_id, outcome.to_schedule_id
            ),
            from_total_students: outcome.counts.from_total_students,
            to_total_students: outcome.counts.to_total_students,
        }
    }
}

/// Response of the CSV upload endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

impl ImportResponse {
    pub fn new(entity: &str, summary: ImportSummary) -> Self {
        Self {
            message: format!("Imported {} {}", summary.added, entity),
            summary,
        }
    }
}
