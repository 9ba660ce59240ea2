//! Bulk import of students and exams from CSV uploads.
//!
//! Files must carry a header row naming every required column (in any
//! order, case-insensitive, extra columns ignored). Rows that fail to parse
//! are reported back as `"Row N: reason"` while the rest are imported; `N`
//! counts file lines, so the first data row is row 2.

mod csv_import;

pub use csv_import::{
    import_exams, import_students, parse_exams, parse_students, ImportSummary, Parsed,
    RosterImportError, EXAM_COLUMNS, STUDENT_COLUMNS,
};
