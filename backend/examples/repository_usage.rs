//! Walk through a scheduling day against the in-memory repository.
//!
//! ```bash
//! cargo run --example repository_usage
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use lab_scheduler::db::repository::{
    ExamRepository, FullRepository, RepositoryError, ScheduleRepository, StudentRepository,
};
use lab_scheduler::db::RepositoryFactory;
use lab_scheduler::export::render_printable;
use lab_scheduler::models::{NewExam, ScheduleFilter, ScheduleId, Student, TimeSlot};
use lab_scheduler::services::{
    generate_schedules, move_student, GenerateRequest, MoveStudentRequest, SchedulingContext,
};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {}-{}-{}", y, m, d).into())
}

async fn seed(repo: &dyn FullRepository) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Seeding roster ===");
    let mut roster = Vec::new();
    for (branch, semester, count) in [("CSE-A", 5, 5), ("CSE-B", 5, 3), ("ECE", 3, 2)] {
        for i in 1..=count {
            roster.push(Student::new(
                format!("{}{}{:03}", branch, semester, i),
                format!("Student {}", i),
                branch,
                semester,
            ));
        }
    }
    let added = repo.upsert_students(&roster).await?;
    println!("Stored {} students", added);
    Ok(())
}

async fn generate_day(
    repo: &dyn FullRepository,
    ctx: &SchedulingContext,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Generating batches ===");
    let exam = repo
        .insert_exam(&NewExam {
            subject_code: "CSL333".to_string(),
            subject_name: "Database Lab".to_string(),
            lab_no: "LAB-2".to_string(),
            date_start: date(2025, 10, 27)?,
            date_end: date(2025, 10, 31)?,
            examiner_internal: "Dr. Rao".to_string(),
            examiner_external: "Dr. Iyer".to_string(),
        })
        .await?;

    let request = GenerateRequest {
        exam_id: exam.exam_id,
        date: date(2025, 10, 31)?,
        time_slots: vec![
            TimeSlot::new("Morning", "09:30", "11:30"),
            TimeSlot::new("Afternoon", "13:00", "15:00"),
        ],
        max_students_per_batch: 2,
    };
    let outcome = generate_schedules(repo, ctx, &request).await?;
    for schedule in &outcome.schedules {
        println!(
            "  batch {} -> schedule {} ({}, {}): {} students",
            schedule.batch_number,
            schedule.schedule_id,
            schedule.time_slot,
            schedule.group,
            schedule.total_students
        );
    }

    // Same date again: everybody is taken.
    let again = generate_schedules(repo, ctx, &request).await?;
    if let Some(message) = again.message() {
        println!("Second run: {}", message);
    }

    if let [first, second, ..] = outcome.schedules.as_slice() {
        let moved = move_student(
            repo,
            ctx,
            &MoveStudentRequest {
                student_reg_no: first.students[0].reg_no.clone(),
                from_schedule_id: first.schedule_id,
                to_schedule_id: second.schedule_id,
            },
        )
        .await?;
        println!(
            "Moved {}: totals now {} / {}",
            moved.reg_no, moved.counts.from_total_students, moved.counts.to_total_students
        );
    }
    Ok(())
}

async fn error_handling(repo: &dyn FullRepository) {
    println!("\n=== Error Handling ===");
    match repo.get_schedule(ScheduleId::new(99_999)).await {
        Ok(schedule) => println!("Found schedule {}", schedule.schedule_id),
        Err(RepositoryError::NotFound { message, .. }) => {
            println!("Expected error - {}", message);
        }
        Err(e) => println!("Unexpected error: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let repo: Arc<dyn FullRepository> = RepositoryFactory::create_local();
    let ctx = SchedulingContext::default();

    seed(repo.as_ref()).await?;
    generate_day(repo.as_ref(), &ctx).await?;
    error_handling(repo.as_ref()).await;

    let views = repo.list_schedules(&ScheduleFilter::default()).await?;
    println!("\n{}", render_printable(&views, 10));
    Ok(())
}
