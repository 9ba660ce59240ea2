use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use serde::Serialize;

use crate::db::repository::FullRepository;
use crate::db::services;
use crate::models::{dedup_by_reg_no, NewExam, Student};
use crate::services::{ServiceError, ServiceResult};

pub const STUDENT_COLUMNS: &[&str] = &["reg_no", "name", "branch", "semester"];

pub const EXAM_COLUMNS: &[&str] = &[
    "subject_code",
    "subject_name",
    "lab_no",
    "date_start",
    "date_end",
    "examiner_internal",
    "examiner_external",
];

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("CSV must contain columns: {}; missing: {}", .required.join(", "), .missing.join(", "))]
    MissingColumns {
        required: &'static [&'static str],
        missing: Vec<String>,
    },

    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl From<RosterImportError> for ServiceError {
    fn from(err: RosterImportError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Outcome of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub errors: Vec<String>,
}

/// Rows that parsed, plus one message per row that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub errors: Vec<String>,
}

/// Header name to column index, for the required columns only.
struct Columns(HashMap<&'static str, usize>);

impl Columns {
    fn resolve(
        headers: &StringRecord,
        required: &'static [&'static str],
    ) -> Result<Self, RosterImportError> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let mut found = HashMap::new();
        let mut missing = Vec::new();
        for &column in required {
            match positions.get(column) {
                Some(&i) => {
                    found.insert(column, i);
                }
                None => missing.push(column.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(RosterImportError::MissingColumns { required, missing });
        }
        Ok(Self(found))
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Result<&'r str, String> {
        let value = self
            .0
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or_default();
        if value.is_empty() {
            return Err(format!("missing {}", column));
        }
        Ok(value)
    }
}

fn read_rows<T, R: Read>(
    input: R,
    required: &'static [&'static str],
    parse_row: impl Fn(&Columns, &StringRecord) -> Result<T, String>,
) -> Result<Parsed<T>, RosterImportError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);
    let columns = Columns::resolve(reader.headers()?, required)?;

    let mut parsed = Parsed {
        rows: Vec::new(),
        errors: Vec::new(),
    };
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let outcome = record
            .map_err(|e| e.to_string())
            .and_then(|r| parse_row(&columns, &r));
        match outcome {
            Ok(row) => parsed.rows.push(row),
            Err(reason) => parsed.errors.push(format!("Row {}: {}", line, reason)),
        }
    }
    Ok(parsed)
}

fn parse_date(columns: &Columns, record: &StringRecord, column: &str) -> Result<NaiveDate, String> {
    let raw = columns.get(record, column)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("{} '{}' is not a YYYY-MM-DD date", column, raw))
}

/// Parse a student roster CSV.
pub fn parse_students<R: Read>(input: R) -> Result<Parsed<Student>, RosterImportError> {
    read_rows(input, STUDENT_COLUMNS, |columns, record| {
        let semester_raw = columns.get(record, "semester")?;
        let semester: i32 = semester_raw
            .parse()
            .map_err(|_| format!("semester '{}' is not an integer", semester_raw))?;
        let student = Student::new(
            columns.get(record, "reg_no")?,
            columns.get(record, "name")?,
            columns.get(record, "branch")?,
            semester,
        );
        student.validate()?;
        Ok(student)
    })
}

/// Parse an exam definition CSV.
pub fn parse_exams<R: Read>(input: R) -> Result<Parsed<NewExam>, RosterImportError> {
    read_rows(input, EXAM_COLUMNS, |columns, record| {
        let exam = NewExam {
            subject_code: columns.get(record, "subject_code")?.to_string(),
            subject_name: columns.get(record, "subject_name")?.to_string(),
            lab_no: columns.get(record, "lab_no")?.to_string(),
            date_start: parse_date(columns, record, "date_start")?,
            date_end: parse_date(columns, record, "date_end")?,
            examiner_internal: columns.get(record, "examiner_internal")?.to_string(),
            examiner_external: columns.get(record, "examiner_external")?.to_string(),
        };
        exam.validate()?;
        Ok(exam)
    })
}

/// Import students, replacing existing rows with the same registration
/// number. A file that repeats a number keeps its last row, and `added`
/// counts distinct students.
pub async fn import_students<R: FullRepository + ?Sized>(
    repo: &R,
    csv_bytes: &[u8],
) -> ServiceResult<ImportSummary> {
    let parsed = parse_students(csv_bytes)?;
    let rows = dedup_by_reg_no(&parsed.rows);
    if rows.len() < parsed.rows.len() {
        warn!(
            "{} student rows repeat an earlier reg_no; the later row wins",
            parsed.rows.len() - rows.len()
        );
    }
    let added = repo.upsert_students(&rows).await?;
    if !parsed.errors.is_empty() {
        warn!("Skipped {} student rows during import", parsed.errors.len());
    }
    info!("Imported {} students", added);
    Ok(ImportSummary {
        added,
        errors: parsed.errors,
    })
}

/// Import exams one by one; a row the store rejects is reported like a
/// parse error.
pub async fn import_exams<R: FullRepository + ?Sized>(
    repo: &R,
    csv_bytes: &[u8],
) -> ServiceResult<ImportSummary> {
    let parsed = parse_exams(csv_bytes)?;
    let mut summary = ImportSummary {
        added: 0,
        errors: parsed.errors,
    };
    for exam in &parsed.rows {
        match services::add_exam(repo, exam).await {
            Ok(_) => summary.added += 1,
            Err(e) if e.is_retryable() => return Err(e.into()),
            Err(e) => summary
                .errors
                .push(format!("{} {}: {}", exam.subject_code, exam.lab_no, e.message())),
        }
    }
    if !summary.errors.is_empty() {
        warn!("Skipped {} exam rows during import", summary.errors.len());
    }
    info!("Imported {} exams", summary.added);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::StudentRepository;

    #[test]
    fn test_parse_students_any_column_order() {
        let csv = "Name,reg_no,semester,branch\nAsha,R1,5,CSE-A\nBen,R2,3,ECE\n";
        let parsed = parse_students(csv.as_bytes()).unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0], Student::new("R1", "Asha", "CSE-A", 5));
        assert_eq!(parsed.rows[1].semester, 3);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let err = parse_students("reg_no,name\nR1,Asha\n".as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("reg_no, name, branch, semester"));
        assert!(message.contains("missing: branch, semester"));
    }

    #[test]
    fn test_bad_rows_reported_with_line_numbers() {
        let csv = "reg_no,name,branch,semester\nR1,Asha,CSE,5\nR2,Ben,CSE,fifth\n,Cara,CSE,5\n";
        let parsed = parse_students(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(
            parsed.errors,
            vec![
                "Row 3: semester 'fifth' is not an integer".to_string(),
                "Row 4: missing reg_no".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_exams_checks_dates() {
        let csv = "subject_code,subject_name,lab_no,date_start,date_end,examiner_internal,examiner_external\n\
                   CSL201,DS Lab,LAB-1,2025-10-27,2025-10-31,Dr. A,Dr. B\n\
                   CSL202,OS Lab,LAB-2,31/10/2025,2025-10-31,Dr. A,Dr. B\n\
                   CSL203,CN Lab,LAB-3,2025-11-02,2025-11-01,Dr. A,Dr. B\n";
        let parsed = parse_exams(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 2);
        assert!(parsed.errors[0].starts_with("Row 3: date_start '31/10/2025'"));
        assert!(parsed.errors[1].starts_with("Row 4: date_start 2025-11-02 is after"));
    }

    #[tokio::test]
    async fn test_import_students_upserts() {
        let repo = LocalRepository::new();
        repo.insert_student(&Student::new("R1", "Old", "CSE", 5))
            .await
            .unwrap();

        let csv = "reg_no,name,branch,semester\nR1,New,CSE,5\nR2,Ben,ECE,3\n";
        let summary = import_students(&repo, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.added, 2);
        assert!(summary.errors.is_empty());
        assert_eq!(repo.get_student("R1").await.unwrap().name, "New");
    }

    #[tokio::test]
    async fn test_import_students_repeated_reg_no_keeps_last_row() {
        let repo = LocalRepository::new();
        let csv = "reg_no,name,branch,semester\n\
                   R1,Old,CSE,5\n\
                   R2,Ben,ECE,3\n\
                   R1,New,CSE-A,6\n";
        let summary = import_students(&repo, csv.as_bytes()).await.unwrap();

        assert_eq!(summary.added, 2);
        assert!(summary.errors.is_empty());
        assert_eq!(repo.student_count(), 2);
        assert_eq!(
            repo.get_student("R1").await.unwrap(),
            Student::new("R1", "New", "CSE-A", 6)
        );
    }

    #[tokio::test]
    async fn test_import_with_missing_columns_is_validation() {
        let repo = LocalRepository::new();
        let err = import_exams(&repo, b"subject_code\nCSL201\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
