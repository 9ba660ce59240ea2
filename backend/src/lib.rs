//! # Lab Scheduler
//!
//! Schedules practical lab exams: the roster of one exam date is split into
//! `(branch, semester)` cohorts, sliced into size-bounded batches, and the
//! batches are spread over the day's time slots. Students already sitting
//! another exam that day are skipped, and manual moves are checked against
//! the same rule.
//!
//! ## Architecture
//!
//! - [`models`]: students, exams, schedules and their identifiers
//! - [`scheduler`]: the pure batch planner, the collision checker and
//!   per-date locks
//! - [`services`]: generation and move operations with their error taxonomy
//! - [`db`]: repository traits, the in-memory and PostgreSQL stores,
//!   configuration and thin CRUD services
//! - [`roster`]: CSV import of students and exams
//! - [`export`]: CSV and printable schedule projections
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod export;
pub mod models;
pub mod roster;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
