//! 로그인/세션 통합 테스트

mod common;

use attendance_core::{Role, SchoolError, SessionStore};
use chrono::Duration;
use common::*;

#[tokio::test]
async fn test_login_issues_session_that_resolves() {
    let h = Harness::new();
    h.seed_school().await;

    let session = h
        .state
        .authenticator
        .login(Role::Teacher, TEACHER_ID, TEACHER_PW)
        .await
        .unwrap();

    assert_eq!(session.role, Role::Teacher);
    assert_eq!(session.expires_at - session.issued_at, Duration::seconds(3600));

    let identity = h.state.authenticator.resolve(&session.token).await.unwrap();
    assert!(identity.is(Role::Teacher, TEACHER_ID));
}

#[tokio::test]
async fn test_wrong_password_leaves_no_session() {
    let h = Harness::new();
    h.seed_school().await;

    let err = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, "wrong-password-9")
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::InvalidCredentials));

    let cached = h.store.get(Role::Student, STUDENT_ID).await.unwrap();
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let h = Harness::new();
    h.seed_school().await;

    let unknown = h
        .state
        .authenticator
        .login(Role::Student, "NIS-9999", STUDENT_PW)
        .await
        .unwrap_err();
    let wrong = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, "not-the-password-1")
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_roles_have_separate_credential_tables() {
    let h = Harness::new();
    h.seed_school().await;

    // 학생 NIS로 교사 로그인 시도
    let err = h
        .state
        .authenticator
        .login(Role::Teacher, STUDENT_ID, STUDENT_PW)
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::InvalidCredentials));
}

#[tokio::test]
async fn test_inactive_account_with_correct_password_is_deactivated() {
    let h = Harness::new();
    h.seed(Role::Teacher, "NIP-3001", "Pak Joko", TEACHER_PW, false)
        .await;

    let err = h
        .state
        .authenticator
        .login(Role::Teacher, "NIP-3001", TEACHER_PW)
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::AccountDeactivated));

    // 비밀번호가 틀리면 비활성 여부를 드러내지 않음
    let err = h
        .state
        .authenticator
        .login(Role::Teacher, "NIP-3001", "wrong-password-9")
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::InvalidCredentials));
}

#[tokio::test]
async fn test_relogin_invalidates_previous_token() {
    let h = Harness::new();
    h.seed_school().await;

    let first = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(5));
    let second = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    assert_ne!(first.token, second.token);
    assert!(matches!(
        h.state.authenticator.resolve(&first.token).await,
        Err(SchoolError::Unauthenticated(_))
    ));
    assert!(h.state.authenticator.resolve(&second.token).await.is_ok());
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let h = Harness::new();
    h.seed_school().await;

    let session = h
        .state
        .authenticator
        .login(Role::Admin, ADMIN_ID, ADMIN_PW)
        .await
        .unwrap();
    h.state
        .authenticator
        .logout(Role::Admin, ADMIN_ID)
        .await
        .unwrap();

    assert!(matches!(
        h.state.authenticator.resolve(&session.token).await,
        Err(SchoolError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_token_expires_with_session_ttl() {
    let h = Harness::new();
    h.seed_school().await;

    let session = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(3601));
    assert!(matches!(
        h.state.authenticator.resolve(&session.token).await,
        Err(SchoolError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn test_admin_login_records_last_login() {
    let h = Harness::new();
    h.seed_school().await;

    h.state
        .authenticator
        .login(Role::Admin, ADMIN_ID, ADMIN_PW)
        .await
        .unwrap();

    let admin = h.store.principal(Role::Admin, ADMIN_ID).await.unwrap();
    assert_eq!(admin.last_login_at, Some(school_morning()));
}

#[tokio::test]
async fn test_change_password_requires_current_and_drops_session() {
    let h = Harness::new();
    h.seed_school().await;

    let session = h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, STUDENT_PW)
        .await
        .unwrap();

    let err = h
        .state
        .authenticator
        .change_password(Role::Student, STUDENT_ID, "wrong-password-9", "brand-new-pass-2")
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::InvalidCredentials));

    let err = h
        .state
        .authenticator
        .change_password(Role::Student, STUDENT_ID, STUDENT_PW, "short")
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::Validation(_)));

    h.state
        .authenticator
        .change_password(Role::Student, STUDENT_ID, STUDENT_PW, "brand-new-pass-2")
        .await
        .unwrap();

    assert!(h.state.authenticator.resolve(&session.token).await.is_err());
    assert!(h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, STUDENT_PW)
        .await
        .is_err());
    assert!(h
        .state
        .authenticator
        .login(Role::Student, STUDENT_ID, "brand-new-pass-2")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_reset_password_for_unknown_user_is_not_found() {
    let h = Harness::new();
    h.seed_school().await;

    let err = h
        .state
        .authenticator
        .reset_password(Role::Teacher, "NIP-0000", "brand-new-pass-2")
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::NotFound(_)));
}

#[tokio::test]
async fn test_deactivation_revokes_session() {
    let h = Harness::new();
    h.seed_school().await;

    let session = h
        .state
        .authenticator
        .login(Role::Teacher, TEACHER_ID, TEACHER_PW)
        .await
        .unwrap();

    h.state
        .authenticator
        .set_active(Role::Teacher, TEACHER_ID, false)
        .await
        .unwrap();

    assert!(h.state.authenticator.resolve(&session.token).await.is_err());
    assert!(matches!(
        h.state
            .authenticator
            .login(Role::Teacher, TEACHER_ID, TEACHER_PW)
            .await,
        Err(SchoolError::AccountDeactivated)
    ));

    h.state
        .authenticator
        .set_active(Role::Teacher, TEACHER_ID, true)
        .await
        .unwrap();
    assert!(h
        .state
        .authenticator
        .login(Role::Teacher, TEACHER_ID, TEACHER_PW)
        .await
        .is_ok());
}
