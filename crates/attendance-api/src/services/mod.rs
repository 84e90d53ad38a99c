//! 비즈니스 서비스 계층.
//!
//! 핸들러는 요청 파싱과 응답 변환만 담당하고, 규칙은 이 모듈의 서비스가
//! 저장소 port를 통해 처리합니다.

mod absence;
mod attendance;
mod authenticator;

pub use absence::{AbsenceUpdate, AbsenceWorkflow};
pub use attendance::{AttendanceRecorder, MarkedAttendance};
pub use authenticator::Authenticator;

use attendance_core::{Identity, Permission, SchoolError, SchoolResult};

/// 역할 권한 확인. 부족하면 `SchoolError::Unauthorized`.
pub fn ensure_permission(identity: &Identity, permission: Permission) -> SchoolResult<()> {
    if identity.role.has_permission(permission) {
        Ok(())
    } else {
        Err(SchoolError::Unauthorized(format!(
            "{} 권한이 필요합니다",
            permission.description()
        )))
    }
}
