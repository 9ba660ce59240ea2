use super::*;
use crate::db::repositories::LocalRepository;
use chrono::NaiveDate;

fn exam(start: (i32, u32, u32), end: (i32, u32, u32)) -> NewExam {
    NewExam {
        subject_code: "CSL201".to_string(),
        subject_name: "Data Structures Lab".to_string(),
        lab_no: "LAB-1".to_string(),
        date_start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        date_end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        examiner_internal: "Dr. Menon".to_string(),
        examiner_external: "Dr. Pillai".to_string(),
    }
}

#[tokio::test]
async fn test_health_check_follows_repository() {
    let repo = LocalRepository::new();
    assert!(health_check(&repo).await.unwrap());
    repo.set_healthy(false);
    assert!(!health_check(&repo).await.unwrap());
}

#[tokio::test]
async fn test_add_student_validates_before_insert() {
    let repo = LocalRepository::new();
    let err = add_student(&repo, &Student::new("R1", "", "CSE", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
    assert_eq!(repo.student_count(), 0);
}

#[tokio::test]
async fn test_add_student_twice_conflicts() {
    let repo = LocalRepository::new();
    let student = Student::new("R1", "Asha", "CSE", 5);
    add_student(&repo, &student).await.unwrap();
    let err = add_student(&repo, &student).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));
}

#[tokio::test]
async fn test_add_exam_rejects_inverted_dates() {
    let repo = LocalRepository::new();
    let err = add_exam(&repo, &exam((2025, 11, 2), (2025, 11, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
    assert!(list_exams(&repo).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exams_listed_by_start_date() {
    let repo = LocalRepository::new();
    let later = add_exam(&repo, &exam((2025, 11, 3), (2025, 11, 4)))
        .await
        .unwrap();
    let sooner = add_exam(&repo, &exam((2025, 10, 27), (2025, 10, 31)))
        .await
        .unwrap();

    let ids: Vec<ExamId> = list_exams(&repo)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.exam_id)
        .collect();
    assert_eq!(ids, vec![sooner.exam_id, later.exam_id]);
}

#[tokio::test]
async fn test_delete_unknown_schedule_is_not_found() {
    let repo = LocalRepository::new();
    let err = delete_schedule(&repo, ScheduleId::new(7)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}
