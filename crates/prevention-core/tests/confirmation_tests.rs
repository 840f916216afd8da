//! Self-examination confirmation integration tests.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use prevention_core::db::Database;
use prevention_core::{
    Account, ErrorKind, ExaminationRecordService, FixedClock, PreventionPolicy, PreventionService,
    SelfExaminationRecord, SelfExaminationResult, SelfExaminationType, ServiceError, Sex,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn shift(date: NaiveDate, offset_days: i64) -> NaiveDate {
    if offset_days >= 0 {
        date + Days::new(offset_days as u64)
    } else {
        date - Days::new(offset_days.unsigned_abs())
    }
}

/// Database with one account and, optionally, one scheduled record.
fn setup(sex: Sex, exam_type: SelfExaminationType, due: Option<NaiveDate>) -> (Database, Account) {
    let db = Database::open_in_memory().unwrap();
    let account = Account::new("101".to_string(), "jana@example.com".to_string(), sex);
    db.insert_account(&account).unwrap();
    if let Some(due) = due {
        db.insert_self_examination_record(&SelfExaminationRecord::new(
            "101".to_string(),
            exam_type,
            due,
        ))
        .unwrap();
    }
    (db, account)
}

fn confirm(
    db: &Database,
    policy: &PreventionPolicy,
    today: NaiveDate,
    exam_type: SelfExaminationType,
    result: SelfExaminationResult,
) -> Result<prevention_core::ScheduleAdvance, ServiceError> {
    let clock = FixedClock(today);
    let service = ExaminationRecordService::new(db, PreventionService::new(db, policy), &clock);
    service.confirm_self_exam(exam_type, result, "101")
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_happy_case() -> anyhow::Result<()> {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Breast, Some(today()));
    let policy = PreventionPolicy::default();

    let advance = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Breast,
        SelfExaminationResult::Ok,
    )?;

    assert_eq!(advance.previous.due_date, today());
    assert_eq!(advance.next.due_date, NaiveDate::from_ymd_opt(2024, 7, 12).unwrap());

    let records = db.list_self_examination_records("101", SelfExaminationType::Breast)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], advance.next);

    let outcomes = db.list_self_examination_outcomes("101", SelfExaminationType::Breast)?;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, SelfExaminationResult::Ok);
    assert_eq!(outcomes[0].record_id, advance.previous.record_id);
    Ok(())
}

#[test]
fn test_not_suitable_sex() {
    let (db, _) = setup(Sex::Male, SelfExaminationType::Breast, Some(today()));
    let policy = PreventionPolicy::default();

    let err = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Breast,
        SelfExaminationResult::Ok,
    )
    .unwrap_err();

    assert!(matches!(err, ServiceError::SexNotEligible { .. }));
    assert_eq!(err.kind(), ErrorKind::DomainValidation);
}

#[test]
fn test_due_three_days_ago_rejected() {
    let due = shift(today(), -3);
    let (db, _) = setup(Sex::Female, SelfExaminationType::Breast, Some(due));
    let policy = PreventionPolicy::default();

    let err = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Breast,
        SelfExaminationResult::Ok,
    )
    .unwrap_err();

    assert!(matches!(err, ServiceError::TooLate { .. }));
    assert_eq!(err.kind(), ErrorKind::DomainValidation);
}

#[test]
fn test_due_in_three_days_rejected() {
    let due = shift(today(), 3);
    let (db, _) = setup(Sex::Female, SelfExaminationType::Breast, Some(due));
    let policy = PreventionPolicy::default();

    let err = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Breast,
        SelfExaminationResult::Ok,
    )
    .unwrap_err();

    assert!(matches!(err, ServiceError::TooEarly { .. }));
    assert_eq!(err.kind(), ErrorKind::DomainValidation);
}

#[test]
fn test_missing_schedule_is_internal_state() {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Breast, None);
    let policy = PreventionPolicy::default();

    let err = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Breast,
        SelfExaminationResult::Ok,
    )
    .unwrap_err();

    assert!(matches!(err, ServiceError::MissingSchedule { .. }));
    assert_eq!(err.kind(), ErrorKind::InternalState);
}

#[test]
fn test_unknown_account() {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Breast, Some(today()));
    let policy = PreventionPolicy::default();
    let clock = FixedClock(today());
    let service = ExaminationRecordService::new(&db, PreventionService::new(&db, &policy), &clock);

    let err = service
        .confirm_self_exam(SelfExaminationType::Breast, SelfExaminationResult::Ok, "999")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_finding_shortens_next_interval() -> anyhow::Result<()> {
    let (db, _) = setup(Sex::Male, SelfExaminationType::Testicular, Some(today()));
    let policy = PreventionPolicy::default();

    let advance = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Testicular,
        SelfExaminationResult::Finding,
    )?;
    assert_eq!(advance.next.due_date, shift(today(), 14));
    assert_eq!(advance.outcome.result, SelfExaminationResult::Finding);
    Ok(())
}

#[test]
fn test_confirmed_cycle_cannot_be_confirmed_twice() {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Skin, Some(today()));
    let policy = PreventionPolicy::default();

    confirm(&db, &policy, today(), SelfExaminationType::Skin, SelfExaminationResult::Ok).unwrap();

    // The next cycle is a month out, so a repeat today is too early
    let err = confirm(&db, &policy, today(), SelfExaminationType::Skin, SelfExaminationResult::Ok)
        .unwrap_err();
    assert!(matches!(err, ServiceError::TooEarly { .. }));
}

#[test]
fn test_current_record_is_newest_due_date() -> anyhow::Result<()> {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Skin, Some(shift(today(), -30)));
    db.insert_self_examination_record(&SelfExaminationRecord::new(
        "101".to_string(),
        SelfExaminationType::Skin,
        today(),
    ))?;
    let policy = PreventionPolicy::default();

    // Validation runs against the newest record, not the overdue one
    let advance = confirm(&db, &policy, today(), SelfExaminationType::Skin, SelfExaminationResult::Ok)?;
    assert_eq!(advance.previous.due_date, today());
    Ok(())
}

#[test]
fn test_custom_tolerance() {
    let (db, _) = setup(Sex::Female, SelfExaminationType::Skin, Some(shift(today(), -3)));
    let policy = PreventionPolicy::from_json_str(r#"{ "tolerance_days_after": 3 }"#).unwrap();

    assert!(confirm(&db, &policy, today(), SelfExaminationType::Skin, SelfExaminationResult::Ok).is_ok());
}

#[test]
fn test_widest_tolerance_still_one_confirmation_per_day() {
    // Confirmed on the last day of the window, so the follow-up window is as close as it gets
    let due = shift(today(), -7);
    let (db, _) = setup(Sex::Female, SelfExaminationType::Skin, Some(due));
    let policy =
        PreventionPolicy::from_json_str(r#"{ "tolerance_days_before": 6, "tolerance_days_after": 7 }"#)
            .unwrap();

    let advance = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Skin,
        SelfExaminationResult::Finding,
    )
    .unwrap();
    assert_eq!(advance.next.due_date, shift(due, 14));

    let err = confirm(
        &db,
        &policy,
        today(),
        SelfExaminationType::Skin,
        SelfExaminationResult::Finding,
    )
    .unwrap_err();
    assert!(matches!(err, ServiceError::TooEarly { .. }));

    let records = db
        .list_self_examination_records("101", SelfExaminationType::Skin)
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_overlapping_windows_policy_rejected() {
    let result =
        PreventionPolicy::from_json_str(r#"{ "tolerance_days_before": 20, "tolerance_days_after": 20 }"#);
    assert!(matches!(result, Err(prevention_core::ConfigError::Invalid(_))));
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn test_concurrent_confirmations_have_one_winner() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("prevention.db");

    {
        let db = Database::open(&path)?;
        let account = Account::new("101".to_string(), "jana@example.com".to_string(), Sex::Female);
        db.insert_account(&account)?;
        db.insert_self_examination_record(&SelfExaminationRecord::new(
            "101".to_string(),
            SelfExaminationType::Breast,
            today(),
        ))?;
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                let policy = PreventionPolicy::default();
                barrier.wait();
                confirm(
                    &db,
                    &policy,
                    today(),
                    SelfExaminationType::Breast,
                    SelfExaminationResult::Ok,
                )
                .map(|advance| advance.next.due_date)
                .map_err(|err| err.kind())
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "results: {:?}", results);

    // The loser either lost the compare-and-swap or saw the advanced schedule
    for result in &results {
        if let Err(kind) = result {
            assert!(
                *kind == ErrorKind::Conflict || *kind == ErrorKind::DomainValidation,
                "unexpected error kind: {:?}",
                kind
            );
        }
    }

    let db = Database::open(&path)?;
    let records = db.list_self_examination_records("101", SelfExaminationType::Breast)?;
    assert_eq!(records.len(), 2);
    let outcomes = db.list_self_examination_outcomes("101", SelfExaminationType::Breast)?;
    assert_eq!(outcomes.len(), 1);
    Ok(())
}

// =========================================================================
// Properties
// =========================================================================

fn any_sex() -> impl Strategy<Value = Sex> {
    prop::sample::select(Sex::ALL.to_vec())
}

fn any_type() -> impl Strategy<Value = SelfExaminationType> {
    prop::sample::select(SelfExaminationType::ALL.to_vec())
}

fn any_result() -> impl Strategy<Value = SelfExaminationResult> {
    prop::sample::select(vec![SelfExaminationResult::Ok, SelfExaminationResult::Finding])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ineligible_sex_always_rejected(
        sex in any_sex(),
        exam_type in any_type(),
        result in any_result(),
        offset in -60i64..60,
    ) {
        prop_assume!(!exam_type.is_eligible(sex));
        let (db, _) = setup(sex, exam_type, Some(shift(today(), offset)));
        let policy = PreventionPolicy::default();

        let err = confirm(&db, &policy, today(), exam_type, result).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::DomainValidation);
        let is_sex_error = matches!(err, ServiceError::SexNotEligible { .. });
        prop_assert!(is_sex_error);
    }

    #[test]
    fn prop_window_decides_eligible_confirmations(
        sex in any_sex(),
        exam_type in any_type(),
        result in any_result(),
        offset in -10i64..10,
    ) {
        prop_assume!(exam_type.is_eligible(sex));
        let due = shift(today(), offset);
        let (db, account) = setup(sex, exam_type, Some(due));
        let policy = PreventionPolicy::default();

        let outcome = confirm(&db, &policy, today(), exam_type, result);

        if offset.abs() <= 2 {
            let advance = outcome.unwrap();
            prop_assert!(advance.next.due_date > due);
            let newest = db.list_self_examination_records("101", exam_type).unwrap();
            prop_assert_eq!(newest[0].due_date, advance.next.due_date);
        } else {
            prop_assert_eq!(outcome.unwrap_err().kind(), ErrorKind::DomainValidation);
            let records = db.list_self_examination_records("101", exam_type).unwrap();
            prop_assert_eq!(records.len(), 1);
        }

        // Identity and sex are untouched either way
        let stored = db.get_account("101").unwrap().unwrap();
        prop_assert_eq!(stored, account);
    }
}
