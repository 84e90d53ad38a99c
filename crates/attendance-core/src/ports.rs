//! 외부 협력자 추상화.
//!
//! 자격증명 저장소, 세션 캐시, 학급 배정 조회, 출석/결석 신청 저장소를
//! 저장소 중립적인 trait으로 정의합니다. Postgres/Redis 구현과 테스트용
//! 메모리 구현은 `attendance-data` 크레이트에 있습니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AbsenceRequest, AbsenceRequestEdit, AttendancePatch, AttendanceRecord, Decision,
    NewAbsenceRequest, NewAttendance, Page, PageRequest, Principal, Role, Session,
};
use crate::error::SchoolResult;

// =============================================================================
// 인증
// =============================================================================

/// 역할별 자격증명 테이블 접근.
///
/// 세 역할의 테이블을 하나의 인터페이스로 다룹니다. 구현체는 `role`에 따라
/// 대상 테이블을 선택합니다.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// `(role, identity_key)`로 사용자를 조회합니다. 없으면 `Ok(None)`.
    async fn find_principal(&self, role: Role, identity_key: &str)
        -> SchoolResult<Option<Principal>>;

    /// 마지막 로그인 시각 기록.
    async fn record_login(&self, role: Role, identity_key: &str, at: DateTime<Utc>)
        -> SchoolResult<()>;

    /// 비밀번호 해시 교체.
    ///
    /// # Errors
    ///
    /// - `SchoolError::NotFound`: 사용자가 없음
    async fn update_credential_hash(
        &self,
        role: Role,
        identity_key: &str,
        credential_hash: &str,
    ) -> SchoolResult<()>;

    /// 활성 플래그 변경.
    ///
    /// # Errors
    ///
    /// - `SchoolError::NotFound`: 사용자가 없음
    async fn set_active(&self, role: Role, identity_key: &str, active: bool) -> SchoolResult<()>;
}

/// TTL 기반 세션 캐시.
///
/// `(role, identity_key)`마다 하나의 세션만 보관하며 `put`은 무조건 덮어씁니다.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: &Session, ttl_secs: u64) -> SchoolResult<()>;

    async fn get(&self, role: Role, identity_key: &str) -> SchoolResult<Option<Session>>;

    /// 세션 삭제. 없어도 성공합니다.
    async fn delete(&self, role: Role, identity_key: &str) -> SchoolResult<()>;
}

// =============================================================================
// 학급 배정
// =============================================================================

/// 학생/학급 배정 조회.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// 학생의 현재 학급. 배정되지 않았으면 `None`.
    async fn current_class(&self, student_id: &str) -> SchoolResult<Option<Uuid>>;

    /// 교사가 해당 학급의 담임인지 확인.
    async fn is_homeroom_teacher(&self, teacher_id: &str, class_id: Uuid) -> SchoolResult<bool>;
}

// =============================================================================
// 출석 기록
// =============================================================================

/// 출석 기록 저장소.
///
/// 모든 조회는 soft delete된 기록을 제외합니다.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// 새 기록 삽입.
    ///
    /// # Errors
    ///
    /// - `SchoolError::AlreadyMarked`: 같은 학생/날짜의 삭제되지 않은 기록이 이미 있음
    /// - `SchoolError::Storage`: 저장소 장애
    async fn insert(&self, new: NewAttendance) -> SchoolResult<AttendanceRecord>;

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AttendanceRecord>>;

    /// 학생/날짜의 삭제되지 않은 기록.
    async fn find_for_day(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> SchoolResult<Option<AttendanceRecord>>;

    /// 정정 적용. 기록이 없거나 삭제되었으면 `Ok(None)`.
    async fn update(
        &self,
        id: Uuid,
        patch: &AttendancePatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AttendanceRecord>>;

    /// soft delete. 삭제할 기록이 없었으면 `Ok(false)`.
    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool>;
}

// =============================================================================
// 결석 신청
// =============================================================================

/// 결석 신청 저장소.
///
/// 상태를 바꾸는 쓰기는 모두 "대기 상태일 때만" 적용되는 조건부 쓰기입니다.
/// 목록은 최신순으로 정렬됩니다.
#[async_trait]
pub trait AbsenceRequestStore: Send + Sync {
    /// 대기 상태로 삽입.
    async fn insert(&self, new: NewAbsenceRequest, at: DateTime<Utc>)
        -> SchoolResult<AbsenceRequest>;

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AbsenceRequest>>;

    /// 대기 상태일 때만 수정. 조건이 맞지 않으면 `Ok(None)`.
    async fn update_pending(
        &self,
        id: Uuid,
        edit: &AbsenceRequestEdit,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>>;

    /// 대기 상태일 때만 결정 적용. 조건이 맞지 않으면 `Ok(None)`.
    async fn apply_decision(
        &self,
        id: Uuid,
        decision: Decision,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>>;

    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool>;

    async fn list_pending(&self, page: PageRequest) -> SchoolResult<Page<AbsenceRequest>>;

    async fn list_by_student(
        &self,
        student_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>>;

    async fn list_by_class(
        &self,
        class_id: Uuid,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>>;

    /// 교사가 담임인 학급의 신청 목록.
    async fn list_by_teacher(
        &self,
        teacher_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>>;
}

/// 서비스 계층에 주입되는 저장소 묶음.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub directory: Arc<dyn StudentDirectory>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub absence_requests: Arc<dyn AbsenceRequestStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
