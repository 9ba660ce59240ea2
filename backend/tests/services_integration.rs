//! End-to-end scheduling flows against the in-memory repository.

mod support;

use lab_scheduler::db::repository::{CommitMode, ScheduleRepository};
use lab_scheduler::db::services as db_services;
use lab_scheduler::models::{ExamId, ScheduleFilter, ScheduleId};
use lab_scheduler::scheduler::{CollisionChecker, NoStudentsReason};
use lab_scheduler::services::{
    generate_schedules, move_student, MoveStudentRequest, SchedulingContext, ServiceError,
};

use support::{cohort, exam_day, generate_request, next_day, seeded};

fn move_request(reg_no: &str, from: ScheduleId, to: ScheduleId) -> MoveStudentRequest {
    MoveStudentRequest {
        student_reg_no: reg_no.to_string(),
        from_schedule_id: from,
        to_schedule_id: to,
    }
}

#[tokio::test]
async fn test_five_students_split_two_per_batch() {
    let (repo, exams) = seeded(&cohort("CSE-A", 5, 5), &["CSL333"]).await;
    let ctx = SchedulingContext::default();

    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 2))
        .await
        .unwrap();

    let sizes: Vec<usize> = outcome.schedules.iter().map(|s| s.total_students).collect();
    let slots: Vec<&str> = outcome.schedules.iter().map(|s| s.time_slot.as_str()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(slots, vec!["09:30–11:30", "13:00–15:00", "09:30–11:30"]);
    assert!(outcome.message().is_none());
    assert_eq!(repo.schedule_count(), 3);
    assert_eq!(repo.assignment_count(), 5);
}

#[tokio::test]
async fn test_generation_is_idempotent_for_a_date() {
    let roster = cohort("ECE", 3, 4);
    let (repo, exams) = seeded(&roster, &["ECL201"]).await;
    let ctx = SchedulingContext::default();
    let request = generate_request(&exams[0], exam_day(), 3);

    generate_schedules(&repo, &ctx, &request).await.unwrap();

    let checker = CollisionChecker::new(&repo);
    for student in &roster {
        assert!(checker
            .has_collision(&student.reg_no, exam_day(), None)
            .await
            .unwrap());
    }

    let second = generate_schedules(&repo, &ctx, &request).await.unwrap();
    assert!(second.schedules.is_empty());
    assert_eq!(second.no_students, Some(NoStudentsReason::AllAlreadyScheduled));
    assert_eq!(repo.schedule_count(), 2);
}

#[tokio::test]
async fn test_students_busy_with_another_exam_are_skipped() {
    let (repo, exams) = seeded(&cohort("CSE-A", 5, 3), &["CSL333", "CSL334"]).await;
    let ctx = SchedulingContext::default();

    generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 5))
        .await
        .unwrap();
    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[1], exam_day(), 5))
        .await
        .unwrap();

    assert!(outcome.schedules.is_empty());
    assert_eq!(
        outcome.message().unwrap(),
        "All students are already scheduled on 2025-10-31"
    );

    // The next day is free.
    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[1], next_day(), 5))
        .await
        .unwrap();
    assert_eq!(outcome.schedules.len(), 1);
    assert_eq!(outcome.schedules[0].total_students, 3);
}

#[tokio::test]
async fn test_empty_roster_reports_no_students() {
    let (repo, exams) = seeded(&[], &["CSL333"]).await;
    let outcome = generate_schedules(
        &repo,
        &SchedulingContext::default(),
        &generate_request(&exams[0], exam_day(), 2),
    )
    .await
    .unwrap();
    assert_eq!(outcome.no_students, Some(NoStudentsReason::EmptyRoster));
    assert_eq!(outcome.message().as_deref(), Some("No students found"));
}

#[tokio::test]
async fn test_empty_time_slots_are_rejected() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 3), &["CSL333"]).await;
    let mut request = generate_request(&exams[0], exam_day(), 2);
    request.time_slots.clear();

    let err = generate_schedules(&repo, &SchedulingContext::default(), &request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(repo.schedule_count(), 0);
}

#[tokio::test]
async fn test_non_positive_batch_size_is_rejected() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 3), &["CSL333"]).await;
    for cap in [0, -3] {
        let err = generate_schedules(
            &repo,
            &SchedulingContext::default(),
            &generate_request(&exams[0], exam_day(), cap),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "cap {}", cap);
    }
}

#[tokio::test]
async fn test_unknown_exam_is_not_found() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 3), &["CSL333"]).await;
    let mut request = generate_request(&exams[0], exam_day(), 2);
    request.exam_id = ExamId::new(999);

    let err = generate_schedules(&repo, &SchedulingContext::default(), &request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_per_schedule_commit_mode_stores_same_batches() {
    let roster = cohort("ME", 7, 5);
    let (atomic_repo, atomic_exams) = seeded(&roster, &["MEL401"]).await;
    let (per_repo, per_exams) = seeded(&roster, &["MEL401"]).await;

    let atomic = generate_schedules(
        &atomic_repo,
        &SchedulingContext::new(CommitMode::Atomic),
        &generate_request(&atomic_exams[0], exam_day(), 2),
    )
    .await
    .unwrap();
    let per_schedule = generate_schedules(
        &per_repo,
        &SchedulingContext::new(CommitMode::PerSchedule),
        &generate_request(&per_exams[0], exam_day(), 2),
    )
    .await
    .unwrap();

    assert_eq!(atomic, per_schedule);
    assert_eq!(per_repo.assignment_count(), 5);
}

#[tokio::test]
async fn test_move_to_another_date_checks_collisions_and_recounts() {
    let (repo, exams) = seeded(&cohort("CSE-A", 5, 3), &["CSL333", "CSL334"]).await;
    let ctx = SchedulingContext::default();

    let day_one = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 3))
        .await
        .unwrap();
    let day_two = generate_schedules(&repo, &ctx, &generate_request(&exams[1], next_day(), 1))
        .await
        .unwrap();
    let batch_of = |reg_no: &str| {
        day_two
            .schedules
            .iter()
            .find(|s| s.students[0].reg_no == reg_no)
            .unwrap()
            .schedule_id
    };
    let from = day_one.schedules[0].schedule_id;
    let target = batch_of("CSE-A5002");

    // CSE-A5001 already sits its own day-two batch.
    let err = move_student(&repo, &ctx, &move_request("CSE-A5001", from, target))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Student CSE-A5001 is already scheduled on 2025-11-01"));

    db_services::delete_schedule(&repo, batch_of("CSE-A5001"))
        .await
        .unwrap();
    let outcome = move_student(&repo, &ctx, &move_request("CSE-A5001", from, target))
        .await
        .unwrap();

    assert_eq!(outcome.counts.from_total_students, 2);
    assert_eq!(outcome.counts.to_total_students, 2);
    assert_eq!(repo.get_schedule(from).await.unwrap().total_students, 2);
    assert_eq!(repo.get_schedule(target).await.unwrap().total_students, 2);
    assert!(repo.is_assigned("CSE-A5001", target).await.unwrap());
    assert!(!repo.is_assigned("CSE-A5001", from).await.unwrap());
}

#[tokio::test]
async fn test_move_between_batches_on_the_same_date() {
    let (repo, exams) = seeded(&cohort("CSE-B", 5, 3), &["CSL333"]).await;
    let ctx = SchedulingContext::default();
    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 2))
        .await
        .unwrap();
    let (first, second) = (outcome.schedules[0].schedule_id, outcome.schedules[1].schedule_id);

    let moved = move_student(&repo, &ctx, &move_request("CSE-B5001", first, second))
        .await
        .unwrap();
    assert_eq!(moved.counts.from_total_students, 1);
    assert_eq!(moved.counts.to_total_students, 2);
}

#[tokio::test]
async fn test_move_rejections() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 2), &["CSL333"]).await;
    let ctx = SchedulingContext::default();
    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 1))
        .await
        .unwrap();
    let (first, second) = (outcome.schedules[0].schedule_id, outcome.schedules[1].schedule_id);

    let same = move_student(&repo, &ctx, &move_request("CSE5001", first, first)).await;
    assert!(matches!(same, Err(ServiceError::Validation(_))));

    let blank = move_student(&repo, &ctx, &move_request("  ", first, second)).await;
    assert!(matches!(blank, Err(ServiceError::Validation(_))));

    let missing = move_student(&repo, &ctx, &move_request("CSE5001", first, ScheduleId::new(77))).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(ref m)) if m == "Destination schedule 77 not found"));

    let not_on_source = move_student(&repo, &ctx, &move_request("CSE5002", first, second)).await;
    assert!(matches!(not_on_source, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_deleting_a_schedule_frees_its_students() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 2), &["CSL333", "CSL334"]).await;
    let ctx = SchedulingContext::default();
    let first = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 5))
        .await
        .unwrap();

    db_services::delete_schedule(&repo, first.schedules[0].schedule_id)
        .await
        .unwrap();
    assert_eq!(repo.assignment_count(), 0);

    let again = generate_schedules(&repo, &ctx, &generate_request(&exams[1], exam_day(), 5))
        .await
        .unwrap();
    assert_eq!(again.schedules[0].total_students, 2);
}

#[tokio::test]
async fn test_deleting_a_student_keeps_totals_in_step() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 3), &["CSL333"]).await;
    let ctx = SchedulingContext::default();
    let outcome = generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 5))
        .await
        .unwrap();

    db_services::delete_student(&repo, "CSE5002").await.unwrap();

    let views = db_services::list_schedules(&repo, &ScheduleFilter::default())
        .await
        .unwrap();
    assert_eq!(views[0].schedule_id, outcome.schedules[0].schedule_id);
    assert_eq!(views[0].total_students, 2);
    assert_eq!(views[0].students.len(), 2);
}

#[tokio::test]
async fn test_deleting_an_exam_removes_its_schedules() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 3), &["CSL333"]).await;
    let ctx = SchedulingContext::default();
    generate_schedules(&repo, &ctx, &generate_request(&exams[0], exam_day(), 2))
        .await
        .unwrap();

    db_services::delete_exam(&repo, exams[0].exam_id).await.unwrap();
    assert_eq!(repo.schedule_count(), 0);
    assert_eq!(repo.assignment_count(), 0);
    assert_eq!(repo.student_count(), 3);
}

#[tokio::test]
async fn test_concurrent_generation_for_one_date_never_double_books() {
    let (repo, exams) = seeded(&cohort("CSE", 5, 6), &["CSL333", "CSL334"]).await;
    let repo = std::sync::Arc::new(repo);
    let ctx = SchedulingContext::default();

    let tasks: Vec<_> = exams
        .iter()
        .map(|exam| {
            let repo = repo.clone();
            let ctx = ctx.clone();
            let request = generate_request(exam, exam_day(), 2);
            tokio::spawn(async move { generate_schedules(repo.as_ref(), &ctx, &request).await })
        })
        .collect();

    let mut scheduled = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        scheduled += outcome
            .schedules
            .iter()
            .map(|s| s.total_students)
            .sum::<usize>();
    }

    assert_eq!(scheduled, 6);
    assert_eq!(repo.assignment_count(), 6);
}
