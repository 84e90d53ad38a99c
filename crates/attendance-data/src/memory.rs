//! 테스트용 메모리 저장소.
//!
//! 모든 저장소 trait을 하나의 구조체에서 구현합니다. 상태는 하나의
//! `RwLock` 안에 있으므로 "확인 후 삽입"도 같은 잠금 안에서 원자적으로
//! 처리됩니다. 세션 TTL은 관리하지 않으며 만료 판단은 토큰 검증에 맡깁니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use attendance_core::{
    AbsenceRequest, AbsenceRequestEdit, AbsenceRequestStore, AttendancePatch, AttendanceRecord,
    AttendanceStore, CredentialProvider, Decision, NewAbsenceRequest, NewAttendance, Page,
    PageRequest, Principal, RequestStatus, Role, SchoolError, SchoolResult, Session, SessionStore,
    Stores, StudentDirectory,
};
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

type PrincipalKey = (Role, String);

#[derive(Default)]
struct State {
    principals: HashMap<PrincipalKey, Principal>,
    sessions: HashMap<PrincipalKey, Session>,
    student_classes: HashMap<String, Uuid>,
    homerooms: HashMap<Uuid, String>,
    attendance: Vec<AttendanceRecord>,
    requests: Vec<AbsenceRequest>,
}

impl State {
    fn principal_mut(&mut self, role: Role, identity_key: &str) -> SchoolResult<&mut Principal> {
        self.principals
            .get_mut(&(role, identity_key.to_string()))
            .ok_or_else(|| SchoolError::NotFound(format!("{}:{}", role, identity_key)))
    }

    fn active_request_mut(&mut self, id: Uuid) -> Option<&mut AbsenceRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
    }

    /// 조건에 맞는 신청을 최신순으로 잘라냅니다.
    fn page_of<F>(&self, page: PageRequest, filter: F) -> Page<AbsenceRequest>
    where
        F: Fn(&AbsenceRequest) -> bool,
    {
        let mut matched: Vec<&AbsenceRequest> = self
            .requests
            .iter()
            .filter(|r| !r.is_deleted() && filter(*r))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let skip = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(skip)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Page::new(items, total)
    }
}

/// 메모리 기반 저장소.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 모든 trait 객체를 이 저장소로 채운 묶음.
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            credentials: self.clone(),
            sessions: self.clone(),
            directory: self.clone(),
            attendance: self.clone(),
            absence_requests: self.clone(),
        }
    }

    /// 사용자 등록.
    pub async fn add_principal(
        &self,
        role: Role,
        identity_key: &str,
        display_name: &str,
        credential_hash: &str,
        active: bool,
    ) -> Principal {
        let principal = Principal {
            id: Uuid::new_v4(),
            role,
            identity_key: identity_key.to_string(),
            display_name: display_name.to_string(),
            credential_hash: credential_hash.to_string(),
            active,
            last_login_at: None,
        };
        self.state
            .write()
            .await
            .principals
            .insert((role, identity_key.to_string()), principal.clone());
        principal
    }

    /// 학생을 학급에 배정합니다.
    pub async fn assign_class(&self, student_id: &str, class_id: Uuid) {
        self.state
            .write()
            .await
            .student_classes
            .insert(student_id.to_string(), class_id);
    }

    /// 학급 담임 지정.
    pub async fn set_homeroom(&self, class_id: Uuid, teacher_id: &str) {
        self.state
            .write()
            .await
            .homerooms
            .insert(class_id, teacher_id.to_string());
    }

    /// 삭제된 기록을 포함한 학생의 전체 출석 기록 수.
    pub async fn attendance_rows(&self, student_id: &str) -> usize {
        self.state
            .read()
            .await
            .attendance
            .iter()
            .filter(|r| r.student_id == student_id)
            .count()
    }

    pub async fn principal(&self, role: Role, identity_key: &str) -> Option<Principal> {
        self.state
            .read()
            .await
            .principals
            .get(&(role, identity_key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl CredentialProvider for InMemoryStore {
    async fn find_principal(
        &self,
        role: Role,
        identity_key: &str,
    ) -> SchoolResult<Option<Principal>> {
        Ok(self.principal(role, identity_key).await)
    }

    async fn record_login(
        &self,
        role: Role,
        identity_key: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<()> {
        let mut state = self.state.write().await;
        state.principal_mut(role, identity_key)?.last_login_at = Some(at);
        Ok(())
    }

    async fn update_credential_hash(
        &self,
        role: Role,
        identity_key: &str,
        credential_hash: &str,
    ) -> SchoolResult<()> {
        let mut state = self.state.write().await;
        state.principal_mut(role, identity_key)?.credential_hash = credential_hash.to_string();
        Ok(())
    }

    async fn set_active(&self, role: Role, identity_key: &str, active: bool) -> SchoolResult<()> {
        let mut state = self.state.write().await;
        state.principal_mut(role, identity_key)?.active = active;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn put(&self, session: &Session, _ttl_secs: u64) -> SchoolResult<()> {
        self.state.write().await.sessions.insert(
            (session.role, session.identity_key.clone()),
            session.clone(),
        );
        Ok(())
    }

    async fn get(&self, role: Role, identity_key: &str) -> SchoolResult<Option<Session>> {
        Ok(self
            .state
            .read()
            .await
            .sessions
            .get(&(role, identity_key.to_string()))
            .cloned())
    }

    async fn delete(&self, role: Role, identity_key: &str) -> SchoolResult<()> {
        self.state
            .write()
            .await
            .sessions
            .remove(&(role, identity_key.to_string()));
        Ok(())
    }
}

#[async_trait]
impl StudentDirectory for InMemoryStore {
    async fn current_class(&self, student_id: &str) -> SchoolResult<Option<Uuid>> {
        Ok(self
            .state
            .read()
            .await
            .student_classes
            .get(student_id)
            .copied())
    }

    async fn is_homeroom_teacher(&self, teacher_id: &str, class_id: Uuid) -> SchoolResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .homerooms
            .get(&class_id)
            .is_some_and(|t| t == teacher_id))
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn insert(&self, new: NewAttendance) -> SchoolResult<AttendanceRecord> {
        let mut state = self.state.write().await;
        let duplicate = state
            .attendance
            .iter()
            .any(|r| !r.is_deleted() && r.student_id == new.student_id && r.date == new.date);
        if duplicate {
            return Err(SchoolError::AlreadyMarked);
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            class_id: new.class_id,
            date: new.date,
            status: new.status,
            time_in: new.time_in,
            time_out: None,
            created_by: new.created_by,
            updated_by: None,
            created_at: new.time_in,
            updated_at: None,
            deleted_at: None,
            deleted_by: None,
        };
        state.attendance.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AttendanceRecord>> {
        Ok(self
            .state
            .read()
            .await
            .attendance
            .iter()
            .find(|r| r.id == id && !r.is_deleted())
            .cloned())
    }

    async fn find_for_day(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> SchoolResult<Option<AttendanceRecord>> {
        Ok(self
            .state
            .read()
            .await
            .attendance
            .iter()
            .find(|r| !r.is_deleted() && r.student_id == student_id && r.date == date)
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &AttendancePatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AttendanceRecord>> {
        let mut state = self.state.write().await;
        let Some(record) = state
            .attendance
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
        else {
            return Ok(None);
        };
        patch.apply_to(record, actor, at);
        Ok(Some(record.clone()))
    }

    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool> {
        let mut state = self.state.write().await;
        match state
            .attendance
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
        {
            Some(record) => {
                record.deleted_at = Some(at);
                record.deleted_by = Some(actor.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AbsenceRequestStore for InMemoryStore {
    async fn insert(
        &self,
        new: NewAbsenceRequest,
        at: DateTime<Utc>,
    ) -> SchoolResult<AbsenceRequest> {
        let request = AbsenceRequest {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            class_id: new.class_id,
            request_date: new.request_date,
            reason: new.reason,
            status: RequestStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            created_at: at,
            updated_at: None,
            deleted_at: None,
            deleted_by: None,
        };
        self.state.write().await.requests.push(request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AbsenceRequest>> {
        Ok(self
            .state
            .read()
            .await
            .requests
            .iter()
            .find(|r| r.id == id && !r.is_deleted())
            .cloned())
    }

    async fn update_pending(
        &self,
        id: Uuid,
        edit: &AbsenceRequestEdit,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>> {
        let mut state = self.state.write().await;
        let Some(request) = state.active_request_mut(id) else {
            return Ok(None);
        };
        match request.apply_edit(edit, at) {
            Ok(()) => Ok(Some(request.clone())),
            Err(SchoolError::NotPending) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn apply_decision(
        &self,
        id: Uuid,
        decision: Decision,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>> {
        let mut state = self.state.write().await;
        let Some(request) = state.active_request_mut(id) else {
            return Ok(None);
        };
        match request.apply_decision(decision, actor, at) {
            Ok(()) => Ok(Some(request.clone())),
            Err(SchoolError::NotPending) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool> {
        let mut state = self.state.write().await;
        match state.active_request_mut(id) {
            Some(request) => {
                request.deleted_at = Some(at);
                request.deleted_by = Some(actor.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_pending(&self, page: PageRequest) -> SchoolResult<Page<AbsenceRequest>> {
        let state = self.state.read().await;
        Ok(state.page_of(page, |r| r.status == RequestStatus::Pending))
    }

    async fn list_by_student(
        &self,
        student_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        let state = self.state.read().await;
        Ok(state.page_of(page, |r| r.student_id == student_id))
    }

    async fn list_by_class(
        &self,
        class_id: Uuid,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        let state = self.state.read().await;
        Ok(state.page_of(page, |r| r.class_id == Some(class_id)))
    }

    async fn list_by_teacher(
        &self,
        teacher_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        let state = self.state.read().await;
        let classes: Vec<Uuid> = state
            .homerooms
            .iter()
            .filter(|(_, teacher)| teacher.as_str() == teacher_id)
            .map(|(class_id, _)| *class_id)
            .collect();
        Ok(state.page_of(page, |r| {
            r.class_id.is_some_and(|c| classes.contains(&c))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::AttendanceStatus;
    use chrono::{Duration, TimeZone};

    fn new_attendance(student: &str, date: NaiveDate) -> NewAttendance {
        NewAttendance {
            student_id: student.to_string(),
            class_id: None,
            date,
            status: AttendanceStatus::Present,
            time_in: Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap(),
            created_by: student.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_day_rejected_until_deleted() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let first = AttendanceStore::insert(&*store, new_attendance("S1", date))
            .await
            .unwrap();
        let err = AttendanceStore::insert(&*store, new_attendance("S1", date))
            .await
            .unwrap_err();
        assert_eq!(err, SchoolError::AlreadyMarked);

        assert!(AttendanceStore::soft_delete(&*store, first.id, "T1", Utc::now())
            .await
            .unwrap());
        let second = AttendanceStore::insert(&*store, new_attendance("S1", date))
            .await
            .unwrap();

        let live = store.find_for_day("S1", date).await.unwrap().unwrap();
        assert_eq!(live.id, second.id);
        assert_eq!(store.attendance_rows("S1").await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_leave_one_row() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    AttendanceStore::insert(&*store, new_attendance("S9", date)).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e, SchoolError::AlreadyMarked),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.attendance_rows("S9").await, 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_offset() {
        let store = InMemoryStore::new();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for i in 0..5 {
            AbsenceRequestStore::insert(
                &*store,
                NewAbsenceRequest {
                    student_id: "S1".to_string(),
                    class_id: None,
                    request_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                    reason: format!("reason {}", i),
                },
                base + Duration::minutes(i),
            )
            .await
            .unwrap();
        }

        let page = store
            .list_by_student("S1", PageRequest { limit: 2, offset: 0 })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].reason, "reason 4");

        let beyond = store
            .list_by_student("S1", PageRequest { limit: 2, offset: 1_000 })
            .await
            .unwrap();
        assert_eq!(beyond.total, 5);
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn test_decision_only_applies_once() {
        let store = InMemoryStore::new();
        let request = AbsenceRequestStore::insert(
            &*store,
            NewAbsenceRequest {
                student_id: "S1".to_string(),
                class_id: None,
                request_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                reason: "flu".to_string(),
            },
            Utc::now(),
        )
        .await
        .unwrap();

        let approved = store
            .apply_decision(request.id, Decision::Approve, "T1", Utc::now())
            .await
            .unwrap();
        assert!(approved.is_some());

        let again = store
            .apply_decision(request.id, Decision::Reject, "T2", Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());

        let stored = AbsenceRequestStore::get(&*store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.approved_by.as_deref(), Some("T1"));
    }
}
