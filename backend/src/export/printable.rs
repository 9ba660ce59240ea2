//! Paginated plain-text schedule, one table per page.

use std::collections::BTreeMap;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use super::subject_label;
use crate::models::{GroupKey, ScheduleView};

pub const PRINT_TITLE: &str = "Lab Exam Schedule";

/// Student cell length before it is cut and suffixed with `...`.
pub const STUDENT_TEXT_LIMIT: usize = 50;

const PAGE_BREAK: &str = "\n\u{000C}\n";

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct PrintRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Time Slot")]
    pub time_slot: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Lab")]
    pub lab: String,
    #[tabled(rename = "Branch/Sem")]
    pub branch_sem: String,
    #[tabled(rename = "Students")]
    pub students: String,
    #[tabled(rename = "Total")]
    pub total: usize,
}

fn truncate_students(text: String) -> String {
    if text.chars().count() <= STUDENT_TEXT_LIMIT {
        return text;
    }
    let mut cut: String = text.chars().take(STUDENT_TEXT_LIMIT).collect();
    cut.push_str("...");
    cut
}

/// One row per (schedule, branch, semester). A schedule with no students
/// still gets a single row so it shows up on paper.
pub fn print_rows(views: &[ScheduleView]) -> Vec<PrintRow> {
    let mut rows = Vec::new();
    for view in views {
        let subject = subject_label(&view.subject_code, &view.subject_name);
        let row = |branch_sem: String, students: String, total: usize| PrintRow {
            date: view.date.to_string(),
            time_slot: view.time_slot.clone(),
            subject: subject.clone(),
            lab: view.lab_no.clone(),
            branch_sem,
            students,
            total,
        };

        if view.students.is_empty() {
            rows.push(row("-".to_string(), String::new(), 0));
            continue;
        }

        let mut groups: BTreeMap<GroupKey, Vec<&str>> = BTreeMap::new();
        for student in &view.students {
            groups
                .entry(student.group_key())
                .or_default()
                .push(&student.reg_no);
        }
        for (group, reg_nos) in groups {
            let total = reg_nos.len();
            rows.push(row(
                group.to_string(),
                truncate_students(reg_nos.join(", ")),
                total,
            ));
        }
    }
    rows
}

/// Render the printable schedule. Pages hold at most `rows_per_page` rows,
/// carry the title and a `Page i of n` footer, and are separated by a form
/// feed.
pub fn render_printable(views: &[ScheduleView], rows_per_page: usize) -> String {
    let rows = print_rows(views);
    if rows.is_empty() {
        return format!("{}\n\nNo schedules found\n\nPage 1 of 1\n", PRINT_TITLE);
    }

    let pages: Vec<&[PrintRow]> = rows.chunks(rows_per_page.max(1)).collect();
    let page_count = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            Table::new(page)
                .with(Panel::header(PRINT_TITLE))
                .with(Panel::footer(format!("Page {} of {}", i + 1, page_count)))
                .with(Style::modern())
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(PAGE_BREAK)
}
