use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, ExamId);

/// A lab exam definition. Schedules are tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: ExamId,
    pub subject_code: String,
    pub subject_name: String,
    pub lab_no: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub examiner_internal: String,
    pub examiner_external: String,
}

/// An exam that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExam {
    pub subject_code: String,
    pub subject_name: String,
    pub lab_no: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub examiner_internal: String,
    pub examiner_external: String,
}

impl NewExam {
    pub fn validate(&self) -> Result<(), String> {
        let text_fields = [
            ("subject_code", &self.subject_code),
            ("subject_name", &self.subject_name),
            ("lab_no", &self.lab_no),
            ("examiner_internal", &self.examiner_internal),
            ("examiner_external", &self.examiner_external),
        ];
        for (field, value) in text_fields {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", field));
            }
        }
        if self.date_start > self.date_end {
            return Err(format!(
                "date_start {} is after date_end {}",
                self.date_start, self.date_end
            ));
        }
        Ok(())
    }

    pub fn into_exam(self, exam_id: ExamId) -> Exam {
        Exam {
            exam_id,
            subject_code: self.subject_code,
            subject_name: self.subject_name,
            lab_no: self.lab_no,
            date_start: self.date_start,
            date_end: self.date_end,
            examiner_internal: self.examiner_internal,
            examiner_external: self.examiner_external,
        }
    }
}

impl Exam {
    /// Whether `date` falls inside the exam's window.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }
}
