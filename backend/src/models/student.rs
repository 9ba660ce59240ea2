use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A student on the roster, keyed by registration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    /// Unique registration code (e.g. `MES23CS001`)
    pub reg_no: String,
    /// Display name
    pub name: String,
    /// Branch / division label (e.g. `CSE-A`)
    pub branch: String,
    /// Semester level
    pub semester: i32,
}

impl Student {
    pub fn new(
        reg_no: impl Into<String>,
        name: impl Into<String>,
        branch: impl Into<String>,
        semester: i32,
    ) -> Self {
        Self {
            reg_no: reg_no.into(),
            name: name.into(),
            branch: branch.into(),
            semester,
        }
    }

    /// The `(branch, semester)` cohort this student is batched with.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            branch: self.branch.clone(),
            semester: self.semester,
        }
    }

    /// Check the fields a caller must always supply.
    pub fn validate(&self) -> Result<(), String> {
        if self.reg_no.trim().is_empty() {
            return Err("reg_no must not be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("name must not be empty (reg_no {})", self.reg_no));
        }
        if self.branch.trim().is_empty() {
            return Err(format!("branch must not be empty (reg_no {})", self.reg_no));
        }
        Ok(())
    }
}

/// Cohort key used to cluster students before batching.
///
/// Ordering is `(branch, semester)`, which is also the order groups are
/// visited in during planning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub branch: String,
    pub semester: i32,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.branch, self.semester)
    }
}

impl Serialize for GroupKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Roster ordering: `(branch, semester, reg_no)`.
pub fn sort_roster(students: &mut [Student]) {
    students.sort_by(|a, b| {
        a.branch
            .cmp(&b.branch)
            .then(a.semester.cmp(&b.semester))
            .then_with(|| a.reg_no.cmp(&b.reg_no))
    });
}

/// One entry per registration number, the last occurrence winning. Kept
/// entries stay in the order of those last occurrences.
pub fn dedup_by_reg_no(students: &[Student]) -> Vec<Student> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Student> = students
        .iter()
        .rev()
        .filter(|s| seen.insert(s.reg_no.as_str()))
        .cloned()
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_renders_branch_dash_semester() {
        let student = Student::new("MES23CS001", "Student 001", "CSE-A", 5);
        assert_eq!(student.group_key().to_string(), "CSE-A-5");
    }

    #[test]
    fn test_group_key_serializes_as_label() {
        let key = Student::new("R1", "N", "ECE", 3).group_key();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"ECE-3\"");
    }

    #[test]
    fn test_sort_roster_orders_by_branch_semester_reg_no() {
        let mut roster = vec![
            Student::new("R3", "C", "ECE", 3),
            Student::new("R2", "B", "CSE", 5),
            Student::new("R1", "A", "CSE", 5),
            Student::new("R0", "Z", "CSE", 3),
        ];
        sort_roster(&mut roster);
        let order: Vec<&str> = roster.iter().map(|s| s.reg_no.as_str()).collect();
        assert_eq!(order, vec!["R0", "R1", "R2", "R3"]);
    }

    #[test]
    fn test_dedup_by_reg_no_keeps_last_occurrence() {
        let roster = vec![
            Student::new("R1", "Old", "CSE", 5),
            Student::new("R2", "Ben", "ECE", 3),
            Student::new("R1", "New", "CSE", 5),
        ];
        let deduped = dedup_by_reg_no(&roster);
        let names: Vec<&str> = deduped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ben", "New"]);
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(Student::new("", "A", "CSE", 1).validate().is_err());
        assert!(Student::new("R1", " ", "CSE", 1).validate().is_err());
        assert!(Student::new("R1", "A", "", 1).validate().is_err());
        assert!(Student::new("R1", "A", "CSE", 1).validate().is_ok());
    }
}
