//! 출석 체크 및 정정.

use std::sync::Arc;

use attendance_core::{
    AttendancePatch, AttendanceRecord, AttendanceStatus, AttendanceStore, Clock, Identity,
    NewAttendance, Permission, Role, SchoolError, SchoolResult, StudentDirectory,
};
use chrono_tz::Tz;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{ensure_permission, Authenticator};
use crate::metrics::record_attendance_mark;

/// 출석 체크 결과.
#[derive(Debug, Clone)]
pub struct MarkedAttendance {
    pub student_name: String,
    pub record: AttendanceRecord,
}

/// 출석 기록 서비스.
#[derive(Clone)]
pub struct AttendanceRecorder {
    authenticator: Authenticator,
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn StudentDirectory>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl std::fmt::Debug for AttendanceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceRecorder")
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl AttendanceRecorder {
    pub fn new(
        authenticator: Authenticator,
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn StudentDirectory>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self {
            authenticator,
            store,
            directory,
            clock,
            timezone,
        }
    }

    /// 학생 본인 출석 체크.
    ///
    /// 세션과 무관하게 자격증명을 다시 확인합니다. 학교 시간대 기준 오늘
    /// 이미 기록이 있으면 `AlreadyMarked`. 동시에 들어온 요청은 저장소의
    /// 고유 제약으로 하나만 성공합니다.
    #[instrument(skip(self, password))]
    pub async fn mark_self(&self, student_id: &str, password: &str) -> SchoolResult<MarkedAttendance> {
        let result = self.mark_self_inner(student_id, password).await;

        match &result {
            Ok(marked) => {
                record_attendance_mark("marked");
                info!(record_id = %marked.record.id, date = %marked.record.date, "Attendance marked");
            }
            Err(SchoolError::AlreadyMarked) => record_attendance_mark("already_marked"),
            Err(e) if e.is_client_error() => {
                record_attendance_mark("rejected");
                warn!(error = %e, "Attendance mark rejected");
            }
            Err(_) => record_attendance_mark("error"),
        }

        result
    }

    async fn mark_self_inner(&self, student_id: &str, password: &str) -> SchoolResult<MarkedAttendance> {
        let principal = self
            .authenticator
            .verify_principal(Role::Student, student_id, password)
            .await?;
        ensure_permission(
            &Identity::new(principal.role, principal.identity_key.as_str()),
            Permission::MarkOwnAttendance,
        )?;

        let now = self.clock.now();
        let today = self.clock.today_in(self.timezone);

        if self
            .store
            .find_for_day(&principal.identity_key, today)
            .await?
            .is_some()
        {
            return Err(SchoolError::AlreadyMarked);
        }

        let class_id = self.directory.current_class(&principal.identity_key).await?;
        let record = self
            .store
            .insert(NewAttendance {
                student_id: principal.identity_key.clone(),
                class_id,
                date: today,
                status: AttendanceStatus::Present,
                time_in: now,
                created_by: principal.identity_key.clone(),
            })
            .await?;

        Ok(MarkedAttendance {
            student_name: principal.display_name,
            record,
        })
    }

    /// 관리자 정정. 빈 패치나 `time_out < time_in`은 `Validation`.
    #[instrument(skip(self, patch, actor), fields(actor = %actor.identity_key))]
    pub async fn update(
        &self,
        id: Uuid,
        patch: &AttendancePatch,
        actor: &Identity,
    ) -> SchoolResult<AttendanceRecord> {
        ensure_permission(actor, Permission::CorrectAttendance)?;
        if patch.is_empty() {
            return Err(SchoolError::Validation("변경할 항목이 없습니다".to_string()));
        }

        let current = self.get(id).await?;
        patch.validate_against(&current)?;

        let updated = self
            .store
            .update(id, patch, &actor.identity_key, self.clock.now())
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(record_id = %id, "Attendance corrected");
        Ok(updated)
    }

    /// soft delete (교사/관리자). 없거나 이미 삭제된 기록은 `NotFound`.
    #[instrument(skip(self, actor), fields(actor = %actor.identity_key))]
    pub async fn soft_delete(&self, id: Uuid, actor: &Identity) -> SchoolResult<()> {
        ensure_permission(actor, Permission::DeleteAttendance)?;
        if !self
            .store
            .soft_delete(id, &actor.identity_key, self.clock.now())
            .await?
        {
            return Err(not_found(id));
        }
        info!(record_id = %id, "Attendance deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> SchoolResult<AttendanceRecord> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> SchoolError {
    SchoolError::NotFound(format!("attendance record {}", id))
}
