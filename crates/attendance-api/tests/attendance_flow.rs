//! 출석 체크 통합 테스트

mod common;

use attendance_core::{AttendancePatch, AttendanceStatus, Role, SchoolError};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::*;

#[tokio::test]
async fn test_mark_self_records_present_for_local_day() {
    let h = Harness::new();
    let class_id = h.seed_school().await;

    let marked = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    assert_eq!(marked.student_name, "Budi");
    assert_eq!(marked.record.status, AttendanceStatus::Present);
    assert_eq!(marked.record.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(marked.record.class_id, Some(class_id));
    assert_eq!(marked.record.time_in, school_morning());
    assert_eq!(marked.record.created_by, STUDENT_ID);
}

#[tokio::test]
async fn test_second_mark_same_day_is_rejected() {
    let h = Harness::new();
    h.seed_school().await;

    h.state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    // 09:05
    h.clock.advance(Duration::minutes(5));
    let err = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap_err();

    assert!(matches!(err, SchoolError::AlreadyMarked));
    assert_eq!(h.store.attendance_rows(STUDENT_ID).await, 1);
}

#[tokio::test]
async fn test_concurrent_marks_create_single_row() {
    let h = Harness::new();
    h.seed_school().await;

    let attempts = (0..8).map(|_| {
        let recorder = h.state.attendance.clone();
        async move { recorder.mark_self(STUDENT_ID, STUDENT_PW).await }
    });
    let results = futures::future::join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(SchoolError::AlreadyMarked)))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(h.store.attendance_rows(STUDENT_ID).await, 1);
}

#[tokio::test]
async fn test_day_boundary_follows_school_timezone() {
    let h = Harness::new();
    h.seed_school().await;

    // 2024-03-01 23:30 WIB
    h.clock
        .set(Utc.with_ymd_and_hms(2024, 3, 1, 16, 30, 0).unwrap());
    let evening = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    assert_eq!(evening.record.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

    // 2024-03-02 00:30 WIB, UTC로는 아직 3월 1일
    h.clock
        .set(Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap());
    let next_day = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    assert_eq!(next_day.record.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    assert_eq!(h.store.attendance_rows(STUDENT_ID).await, 2);
}

#[tokio::test]
async fn test_mark_with_wrong_password_creates_nothing() {
    let h = Harness::new();
    h.seed_school().await;

    let err = h
        .state
        .attendance
        .mark_self(STUDENT_ID, "wrong-password-9")
        .await
        .unwrap_err();

    assert!(matches!(err, SchoolError::InvalidCredentials));
    assert_eq!(h.store.attendance_rows(STUDENT_ID).await, 0);
}

#[tokio::test]
async fn test_mark_for_inactive_student_is_deactivated() {
    let h = Harness::new();
    h.seed(Role::Student, "NIS-5000", "Dewi", STUDENT_PW, false)
        .await;

    let err = h
        .state
        .attendance
        .mark_self("NIS-5000", STUDENT_PW)
        .await
        .unwrap_err();

    assert!(matches!(err, SchoolError::AccountDeactivated));
    assert_eq!(h.store.attendance_rows("NIS-5000").await, 0);
}

#[tokio::test]
async fn test_mark_without_class_assignment_keeps_class_empty() {
    let h = Harness::new();
    h.seed_school().await;

    let marked = h
        .state
        .attendance
        .mark_self(OTHER_STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    assert_eq!(marked.record.class_id, None);
}

#[tokio::test]
async fn test_admin_correction_rules() {
    let h = Harness::new();
    h.seed_school().await;

    let marked = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    let id = marked.record.id;

    let err = h
        .state
        .attendance
        .update(id, &AttendancePatch::default(), &identity(Role::Admin, ADMIN_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::Validation(_)));

    let backwards = AttendancePatch {
        time_out: Some(school_morning() - Duration::hours(1)),
        ..Default::default()
    };
    let err = h
        .state
        .attendance
        .update(id, &backwards, &identity(Role::Admin, ADMIN_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::Validation(_)));

    let late = AttendancePatch {
        status: Some(AttendanceStatus::Late),
        time_out: Some(school_morning() + Duration::hours(6)),
        ..Default::default()
    };
    let updated = h
        .state
        .attendance
        .update(id, &late, &identity(Role::Admin, ADMIN_ID))
        .await
        .unwrap();
    assert_eq!(updated.status, AttendanceStatus::Late);
    assert_eq!(updated.updated_by.as_deref(), Some(ADMIN_ID));
    assert_eq!(updated.time_in, school_morning());
}

#[tokio::test]
async fn test_correction_and_delete_are_role_gated() {
    let h = Harness::new();
    h.seed_school().await;

    let marked = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    let id = marked.record.id;

    let late = AttendancePatch {
        status: Some(AttendanceStatus::Late),
        ..Default::default()
    };
    let err = h
        .state
        .attendance
        .update(id, &late, &identity(Role::Teacher, TEACHER_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::Unauthorized(_)));

    let err = h
        .state
        .attendance
        .soft_delete(id, &identity(Role::Student, STUDENT_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::Unauthorized(_)));

    let record = h.state.attendance.get(id).await.unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
    assert!(record.updated_by.is_none());
}

#[tokio::test]
async fn test_soft_deleted_record_is_hidden() {
    let h = Harness::new();
    h.seed_school().await;

    let marked = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    let id = marked.record.id;

    h.state
        .attendance
        .soft_delete(id, &identity(Role::Teacher, TEACHER_ID))
        .await
        .unwrap();

    assert!(matches!(
        h.state.attendance.get(id).await,
        Err(SchoolError::NotFound(_))
    ));
    assert!(matches!(
        h.state.attendance.soft_delete(id, &identity(Role::Teacher, TEACHER_ID)).await,
        Err(SchoolError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_mark_again_after_record_deleted() {
    let h = Harness::new();
    h.seed_school().await;

    let first = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    h.state
        .attendance
        .soft_delete(first.record.id, &identity(Role::Admin, ADMIN_ID))
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(10));
    let second = h
        .state
        .attendance
        .mark_self(STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    assert_ne!(first.record.id, second.record.id);
    // 삭제된 행도 보관됨
    assert_eq!(h.store.attendance_rows(STUDENT_ID).await, 2);
}
