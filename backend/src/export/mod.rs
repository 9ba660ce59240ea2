//! Read-only projections of schedule listings for download.
//!
//! - [`csv_export`]: one row per schedule
//! - [`printable`]: paginated text table, one row per branch/semester group
//!   within each schedule

pub mod csv_export;
pub mod printable;

pub use csv_export::{schedules_to_csv, CSV_HEADERS};
pub use printable::{render_printable, PRINT_TITLE};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush export buffer: {0}")]
    Io(#[from] std::io::Error),
}

/// `"{code} - {name}"`, the subject cell of both exports.
pub(crate) fn subject_label(code: &str, name: &str) -> String {
    format!("{} - {}", code, name)
}
