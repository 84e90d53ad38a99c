//! 결석 신청 워크플로우.
//!
//! 상태 전이는 `RequestStatus::decide`가 결정하고, 저장소 쓰기는 모두
//! "대기 상태일 때만" 적용되는 조건부 쓰기입니다. 서비스에서 먼저 읽고
//! 검사한 뒤에도 저장소가 `None`을 돌려주면 그 사이 상태가 바뀐 것이므로
//! `NotPending`으로 응답합니다.

use std::sync::Arc;

use attendance_core::{
    parse_request_date, AbsenceRequest, AbsenceRequestEdit, AbsenceRequestStore, Clock, Decision,
    Identity, NewAbsenceRequest, Page, PageRequest, PaginationConfig, Permission, Role,
    SchoolError, SchoolResult, StudentDirectory,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::ensure_permission;
use crate::metrics::record_absence_decision;

/// 학생 수정 입력 (원본 문자열).
#[derive(Debug, Clone, Default)]
pub struct AbsenceUpdate {
    pub request_date: Option<String>,
    pub reason: Option<String>,
}

/// 결석 신청 서비스.
#[derive(Clone)]
pub struct AbsenceWorkflow {
    store: Arc<dyn AbsenceRequestStore>,
    directory: Arc<dyn StudentDirectory>,
    clock: Arc<dyn Clock>,
    date_format: String,
    pagination: PaginationConfig,
    enforce_class_scope: bool,
}

impl std::fmt::Debug for AbsenceWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbsenceWorkflow")
            .field("date_format", &self.date_format)
            .field("pagination", &self.pagination)
            .field("enforce_class_scope", &self.enforce_class_scope)
            .finish_non_exhaustive()
    }
}

impl AbsenceWorkflow {
    pub fn new(
        store: Arc<dyn AbsenceRequestStore>,
        directory: Arc<dyn StudentDirectory>,
        clock: Arc<dyn Clock>,
        date_format: impl Into<String>,
        pagination: PaginationConfig,
        enforce_class_scope: bool,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            date_format: date_format.into(),
            pagination,
            enforce_class_scope,
        }
    }

    /// 결석 신청 제출.
    ///
    /// 상태는 항상 대기로 시작하며, 학급은 제출 시점의 배정을 복사해 둡니다.
    #[instrument(skip(self, student, reason), fields(student = %student.identity_key))]
    pub async fn create(
        &self,
        student: &Identity,
        request_date: &str,
        reason: &str,
    ) -> SchoolResult<AbsenceRequest> {
        ensure_permission(student, Permission::SubmitAbsenceRequest)?;
        let student_id = student.identity_key.as_str();
        let request_date = parse_request_date(request_date, &self.date_format)?;
        let reason = normalize_reason(reason)?;
        let class_id = self.directory.current_class(student_id).await?;

        let request = self
            .store
            .insert(
                NewAbsenceRequest {
                    student_id: student_id.to_string(),
                    class_id,
                    request_date,
                    reason,
                },
                self.clock.now(),
            )
            .await?;

        info!(request_id = %request.id, date = %request.request_date, "Absence request submitted");
        Ok(request)
    }

    /// 학생 본인 수정. 소유자 확인이 상태 확인보다 먼저입니다.
    ///
    /// # Errors
    ///
    /// - `SchoolError::NotFound`: 신청이 없거나 삭제됨
    /// - `SchoolError::Unauthorized`: 본인 신청이 아님
    /// - `SchoolError::NotPending`: 이미 결정된 신청
    #[instrument(skip(self, student, update), fields(student = %student.identity_key))]
    pub async fn update_own(
        &self,
        id: Uuid,
        student: &Identity,
        update: AbsenceUpdate,
    ) -> SchoolResult<AbsenceRequest> {
        ensure_permission(student, Permission::SubmitAbsenceRequest)?;
        let current = self.load(id).await?;
        if !current.is_owned_by(&student.identity_key) {
            return Err(SchoolError::Unauthorized(
                "본인의 결석 신청만 수정할 수 있습니다".to_string(),
            ));
        }
        current.status.ensure_editable()?;

        let edit = AbsenceRequestEdit {
            request_date: update
                .request_date
                .as_deref()
                .map(|raw| parse_request_date(raw, &self.date_format))
                .transpose()?,
            reason: update.reason.as_deref().map(normalize_reason).transpose()?,
        };
        if edit.is_empty() {
            return Err(SchoolError::Validation("변경할 항목이 없습니다".to_string()));
        }

        let updated = self
            .store
            .update_pending(id, &edit, self.clock.now())
            .await?
            .ok_or(SchoolError::NotPending)?;

        info!(request_id = %id, "Absence request edited");
        Ok(updated)
    }

    /// 교사의 승인/반려.
    ///
    /// `enforce_class_scope`가 켜져 있으면 해당 학급의 담임만 결정할 수 있습니다.
    #[instrument(skip(self, teacher), fields(teacher = %teacher.identity_key))]
    pub async fn decide(
        &self,
        id: Uuid,
        teacher: &Identity,
        decision: Decision,
    ) -> SchoolResult<AbsenceRequest> {
        ensure_permission(teacher, Permission::DecideAbsenceRequest)?;
        let teacher_id = teacher.identity_key.as_str();
        let current = self.load(id).await?;

        if self.enforce_class_scope {
            let in_scope = match current.class_id {
                Some(class_id) => {
                    self.directory
                        .is_homeroom_teacher(teacher_id, class_id)
                        .await?
                }
                None => false,
            };
            if !in_scope {
                return Err(SchoolError::Unauthorized(
                    "담임 학급의 신청만 결정할 수 있습니다".to_string(),
                ));
            }
        }

        current.status.decide(decision)?;

        let decided = self
            .store
            .apply_decision(id, decision, teacher_id, self.clock.now())
            .await?
            .ok_or(SchoolError::NotPending)?;

        record_absence_decision(decision.as_str());
        info!(request_id = %id, status = %decided.status, "Absence request decided");
        Ok(decided)
    }

    /// soft delete (교사/관리자).
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid, actor: &Identity) -> SchoolResult<()> {
        ensure_permission(actor, Permission::DeleteAbsenceRequest)?;
        if !self
            .store
            .soft_delete(id, &actor.identity_key, self.clock.now())
            .await?
        {
            return Err(not_found(id));
        }
        info!(request_id = %id, "Absence request deleted");
        Ok(())
    }

    /// 단건 조회. 학생은 본인 신청만 볼 수 있습니다.
    pub async fn get(&self, id: Uuid, viewer: &Identity) -> SchoolResult<AbsenceRequest> {
        let request = self.load(id).await?;
        if viewer.role == Role::Student {
            if !request.is_owned_by(&viewer.identity_key) {
                return Err(SchoolError::Unauthorized(
                    "본인의 결석 신청만 조회할 수 있습니다".to_string(),
                ));
            }
        } else {
            ensure_permission(viewer, Permission::ViewAbsenceRequests)?;
        }
        Ok(request)
    }

    pub async fn list_pending(
        &self,
        viewer: &Identity,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        ensure_permission(viewer, Permission::ViewAbsenceRequests)?;
        self.store.list_pending(self.page(limit, offset)).await
    }

    /// 학생별 목록. 학생은 본인 목록만 조회할 수 있습니다.
    pub async fn list_by_student(
        &self,
        student_id: &str,
        viewer: &Identity,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        if viewer.role == Role::Student {
            if viewer.identity_key != student_id {
                return Err(SchoolError::Unauthorized(
                    "본인의 결석 신청만 조회할 수 있습니다".to_string(),
                ));
            }
        } else {
            ensure_permission(viewer, Permission::ViewAbsenceRequests)?;
        }
        self.store
            .list_by_student(student_id, self.page(limit, offset))
            .await
    }

    pub async fn list_by_class(
        &self,
        class_id: Uuid,
        viewer: &Identity,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        ensure_permission(viewer, Permission::ViewAbsenceRequests)?;
        self.store
            .list_by_class(class_id, self.page(limit, offset))
            .await
    }

    /// 교사가 담임인 학급의 신청 목록.
    pub async fn list_by_teacher(
        &self,
        teacher_id: &str,
        viewer: &Identity,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        ensure_permission(viewer, Permission::ViewAbsenceRequests)?;
        self.store
            .list_by_teacher(teacher_id, self.page(limit, offset))
            .await
    }

    fn page(&self, limit: Option<i64>, offset: Option<i64>) -> PageRequest {
        PageRequest::clamped(limit, offset, &self.pagination)
    }

    async fn load(&self, id: Uuid) -> SchoolResult<AbsenceRequest> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }
}

fn normalize_reason(raw: &str) -> SchoolResult<String> {
    let reason = raw.trim();
    if reason.is_empty() {
        return Err(SchoolError::Validation("사유를 입력해야 합니다".to_string()));
    }
    Ok(reason.to_string())
}

fn not_found(id: Uuid) -> SchoolError {
    SchoolError::NotFound(format!("absence request {}", id))
}
