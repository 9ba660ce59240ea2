//! CSV export functionality

use csv::WriterBuilder;
use serde::Serialize;

use super::{subject_label, ExportError};
use crate::models::ScheduleView;

pub const CSV_HEADERS: [&str; 6] = ["Date", "Time Slot", "Subject", "Lab", "Students", "Total"];

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    time_slot: &'a str,
    subject: String,
    lab: &'a str,
    students: String,
    total: usize,
}

impl<'a> From<&'a ScheduleView> for CsvRow<'a> {
    fn from(view: &'a ScheduleView) -> Self {
        Self {
            date: view.date.to_string(),
            time_slot: &view.time_slot,
            subject: subject_label(&view.subject_code, &view.subject_name),
            lab: &view.lab_no,
            students: view
                .students
                .iter()
                .map(|s| s.reg_no.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            total: view.total_students,
        }
    }
}

/// Write schedules as CSV. The header row is always present.
pub fn schedules_to_csv(views: &[ScheduleView]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for view in views {
        writer.serialize(CsvRow::from(view))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}
