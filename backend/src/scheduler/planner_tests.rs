use super::*;
use proptest::prelude::*;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
}

fn two_slots() -> Vec<TimeSlot> {
    vec![
        TimeSlot::new("Slot 1", "09:30", "11:30"),
        TimeSlot::new("Slot 2", "13:00", "15:00"),
    ]
}

fn cohort(branch: &str, semester: i32, count: usize) -> Vec<Student> {
    (1..=count)
        .map(|i| {
            Student::new(
                format!("{}{}{:03}", branch, semester, i),
                format!("Student {}", i),
                branch,
                semester,
            )
        })
        .collect()
}

fn request(slots: &[TimeSlot], max_batch_size: usize) -> PlanRequest<'_> {
    PlanRequest {
        exam_id: ExamId::new(1),
        date: date(),
        time_slots: slots,
        max_batch_size,
    }
}

#[test]
fn test_five_students_two_per_batch_two_slots() {
    let slots = two_slots();
    let roster = cohort("CSE-A", 5, 5);

    let outcome = plan(&request(&slots, 2), &roster, &HashSet::new()).unwrap();
    let plans = outcome.plans();

    let sizes: Vec<usize> = plans.iter().map(BatchPlan::total_students).collect();
    let slot_indices: Vec<usize> = plans.iter().map(|p| p.slot_index).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(slot_indices, vec![0, 1, 0]);
    assert_eq!(plans[0].time_slot, "09:30–11:30");
    assert_eq!(plans[1].time_slot, "13:00–15:00");
    assert_eq!(plans[2].time_slot, "09:30–11:30");
    assert_eq!(
        plans.iter().map(|p| p.batch_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_batches_do_not_mix_cohorts() {
    let slots = two_slots();
    let mut roster = cohort("ECE", 3, 3);
    roster.extend(cohort("CSE-B", 5, 2));
    roster.extend(cohort("CSE-A", 5, 1));

    let outcome = plan(&request(&slots, 2), &roster, &HashSet::new()).unwrap();
    let groups: Vec<String> = outcome
        .plans()
        .iter()
        .map(|p| p.group.to_string())
        .collect();

    // CSE-A-5 (1), CSE-B-5 (2), ECE-3 (2 + 1)
    assert_eq!(groups, vec!["CSE-A-5", "CSE-B-5", "ECE-3", "ECE-3"]);
    for plan in outcome.plans() {
        assert!(plan
            .students
            .iter()
            .all(|s| s.group_key() == plan.group));
    }
}

#[test]
fn test_semester_separates_groups_within_branch() {
    let slots = two_slots();
    let mut roster = cohort("CSE", 5, 1);
    roster.extend(cohort("CSE", 3, 1));

    let outcome = plan(&request(&slots, 10), &roster, &HashSet::new()).unwrap();
    let groups: Vec<String> = outcome
        .plans()
        .iter()
        .map(|p| p.group.to_string())
        .collect();
    assert_eq!(groups, vec!["CSE-3", "CSE-5"]);
}

#[test]
fn test_students_inside_batch_follow_reg_no_order() {
    let slots = two_slots();
    let roster = vec![
        Student::new("R3", "C", "CSE", 5),
        Student::new("R1", "A", "CSE", 5),
        Student::new("R2", "B", "CSE", 5),
    ];

    let outcome = plan(&request(&slots, 2), &roster, &HashSet::new()).unwrap();
    let order: Vec<Vec<&str>> = outcome
        .plans()
        .iter()
        .map(|p| p.students.iter().map(|s| s.reg_no.as_str()).collect())
        .collect();
    assert_eq!(order, vec![vec!["R1", "R2"], vec!["R3"]]);
}

#[test]
fn test_round_robin_wraps_past_last_slot() {
    let slots = vec![
        TimeSlot::new("A", "08:00", "09:00"),
        TimeSlot::new("B", "09:00", "10:00"),
        TimeSlot::new("C", "10:00", "11:00"),
    ];
    let roster = cohort("CSE", 5, 7);

    let outcome = plan(&request(&slots, 1), &roster, &HashSet::new()).unwrap();
    let indices: Vec<usize> = outcome.plans().iter().map(|p| p.slot_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 0]);
}

#[test]
fn test_already_scheduled_students_are_skipped() {
    let slots = two_slots();
    let roster = cohort("CSE", 5, 4);
    let scheduled: HashSet<String> = [roster[0].reg_no.clone(), roster[2].reg_no.clone()]
        .into_iter()
        .collect();

    let outcome = plan(&request(&slots, 5), &roster, &scheduled).unwrap();
    let planned: Vec<&str> = outcome.plans()[0]
        .students
        .iter()
        .map(|s| s.reg_no.as_str())
        .collect();
    assert_eq!(planned, vec![roster[1].reg_no.as_str(), roster[3].reg_no.as_str()]);
}

#[test]
fn test_all_already_scheduled_yields_no_students() {
    let slots = two_slots();
    let roster = cohort("CSE-A", 5, 3);
    let scheduled: HashSet<String> = roster.iter().map(|s| s.reg_no.clone()).collect();

    let outcome = plan(&request(&slots, 2), &roster, &scheduled).unwrap();
    assert_eq!(
        outcome,
        PlanOutcome::NoStudents(NoStudentsReason::AllAlreadyScheduled)
    );
    assert!(outcome.plans().is_empty());
}

#[test]
fn test_empty_roster_yields_no_students() {
    let slots = two_slots();
    let outcome = plan(&request(&slots, 2), &[], &HashSet::new()).unwrap();
    assert_eq!(outcome, PlanOutcome::NoStudents(NoStudentsReason::EmptyRoster));
}

#[test]
fn test_empty_time_slots_is_rejected() {
    let roster = cohort("CSE", 5, 3);
    let err = plan(&request(&[], 2), &roster, &HashSet::new()).unwrap_err();
    assert_eq!(err, PlanError::NoTimeSlots);
}

#[test]
fn test_empty_time_slots_rejected_before_roster_check() {
    let err = plan(&request(&[], 2), &[], &HashSet::new()).unwrap_err();
    assert_eq!(err, PlanError::NoTimeSlots);
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let slots = two_slots();
    let roster = cohort("CSE", 5, 3);
    let err = plan(&request(&slots, 0), &roster, &HashSet::new()).unwrap_err();
    assert_eq!(err, PlanError::InvalidBatchSize(0));
}

#[test]
fn test_slot_without_end_time_is_rejected() {
    let slots = vec![
        TimeSlot::new("Slot 1", "09:30", "11:30"),
        TimeSlot::new("Slot 2", "13:00", ""),
    ];
    let err = validate_time_slots(&slots).unwrap_err();
    assert_eq!(
        err,
        PlanError::IncompleteTimeSlot {
            index: 1,
            slot_name: "Slot 2".to_string()
        }
    );
}

#[test]
fn test_batch_size_from_rejects_non_positive() {
    assert_eq!(batch_size_from(3), Ok(3));
    assert_eq!(batch_size_from(0), Err(PlanError::InvalidBatchSize(0)));
    assert_eq!(batch_size_from(-4), Err(PlanError::InvalidBatchSize(-4)));
}

#[test]
fn test_to_new_schedule_carries_reg_nos_in_order() {
    let slots = two_slots();
    let roster = cohort("CSE", 5, 2);
    let outcome = plan(&request(&slots, 5), &roster, &HashSet::new()).unwrap();
    let new_schedule = outcome.plans()[0].to_new_schedule();

    assert_eq!(new_schedule.exam_id, ExamId::new(1));
    assert_eq!(new_schedule.date, date());
    assert_eq!(new_schedule.time_slot, "09:30–11:30");
    assert_eq!(new_schedule.reg_nos, vec!["CSE5001", "CSE5002"]);
    assert_eq!(new_schedule.total_students(), 2);
}

fn roster_strategy() -> impl Strategy<Value = Vec<Student>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["CSE-A", "CSE-B", "ECE", "ME"]),
            1i32..=8,
        ),
        0..60,
    )
    .prop_map(|cohorts| {
        cohorts
            .into_iter()
            .enumerate()
            .map(|(i, (branch, semester))| {
                Student::new(format!("REG{:04}", i), format!("S{}", i), branch, semester)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_every_free_student_in_exactly_one_bounded_batch(
        roster in roster_strategy(),
        max_batch_size in 1usize..8,
        slot_count in 1usize..5,
        skip_every in 2usize..6,
    ) {
        let slots: Vec<TimeSlot> = (0..slot_count)
            .map(|i| TimeSlot::new(format!("S{}", i), format!("{:02}:00", 8 + i), format!("{:02}:30", 8 + i)))
            .collect();
        let scheduled: HashSet<String> = roster
            .iter()
            .enumerate()
            .filter(|(i, _)| i % skip_every == 0)
            .map(|(_, s)| s.reg_no.clone())
            .collect();

        let outcome = plan(&request(&slots, max_batch_size), &roster, &scheduled).unwrap();

        let mut seen: Vec<String> = Vec::new();
        for plan in outcome.plans() {
            prop_assert!(!plan.students.is_empty());
            prop_assert!(plan.students.len() <= max_batch_size);
            seen.extend(plan.students.iter().map(|s| s.reg_no.clone()));
        }

        let mut expected: Vec<String> = roster
            .iter()
            .filter(|s| !scheduled.contains(&s.reg_no))
            .map(|s| s.reg_no.clone())
            .collect();
        let unique: HashSet<&String> = seen.iter().collect();
        prop_assert_eq!(unique.len(), seen.len());

        seen.sort();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_batch_i_gets_slot_i_mod_n(
        roster in roster_strategy(),
        max_batch_size in 1usize..5,
        slot_count in 1usize..6,
    ) {
        let slots: Vec<TimeSlot> = (0..slot_count)
            .map(|i| TimeSlot::new(format!("S{}", i), format!("{:02}:00", 8 + i), format!("{:02}:45", 8 + i)))
            .collect();

        let outcome = plan(&request(&slots, max_batch_size), &roster, &HashSet::new()).unwrap();
        for (i, plan) in outcome.plans().iter().enumerate() {
            prop_assert_eq!(plan.slot_index, i % slot_count);
            prop_assert_eq!(&plan.time_slot, &slots[i % slot_count].label());
            prop_assert_eq!(plan.batch_number, i + 1);
        }
    }

    #[test]
    fn prop_planning_is_deterministic_under_roster_permutation(
        roster in roster_strategy(),
        max_batch_size in 1usize..5,
    ) {
        let slots = two_slots();
        let mut reversed = roster.clone();
        reversed.reverse();

        let forward = plan(&request(&slots, max_batch_size), &roster, &HashSet::new()).unwrap();
        let backward = plan(&request(&slots, max_batch_size), &reversed, &HashSet::new()).unwrap();
        prop_assert_eq!(forward, backward);
    }
}
