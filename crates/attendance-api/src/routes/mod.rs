//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/auth` - 로그인/로그아웃/비밀번호 변경
//! - `/attendance` - 출석 체크/정정/삭제
//! - `/absent-requests` - 결석 신청 워크플로우
//! - `/admin` - 계정 관리

pub mod absence_requests;
pub mod admin;
pub mod attendance;
pub mod auth;
pub mod health;

pub use absence_requests::{absence_requests_router, CreateAbsenceRequest, UpdateAbsenceRequest};
pub use admin::{admin_router, ResetPasswordRequest, SetActiveRequest};
pub use attendance::{attendance_router, MarkAttendanceRequest, MarkAttendanceResponse};
pub use auth::{auth_router, ChangePasswordRequest, LoginRequest, LoginResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse, HealthStatus};

use std::sync::Arc;

use attendance_core::{AbsenceRequest, Page};
use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extract::saturating_i64;
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/auth", auth_router())
        .nest("/attendance", attendance_router())
        .nest("/absent-requests", absence_requests_router())
        .nest("/admin", admin_router())
}

/// 목록 조회 파라미터.
///
/// 요청 값과 무관하게 `limit`은 `1..=pagination.max_limit`으로 보정되고
/// 음수 `offset`은 0이 됩니다. 숫자가 아닌 값만 400입니다.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 페이지 크기 (기본 20, 최대 100)
    #[serde(default, deserialize_with = "saturating_i64")]
    pub limit: Option<i64>,
    /// 건너뛸 항목 수
    #[serde(default, deserialize_with = "saturating_i64")]
    pub offset: Option<i64>,
}

/// 결석 신청 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbsenceRequestList {
    pub items: Vec<AbsenceRequest>,
    /// 페이지와 무관한 전체 개수
    pub total: u64,
}

impl From<Page<AbsenceRequest>> for AbsenceRequestList {
    fn from(page: Page<AbsenceRequest>) -> Self {
        Self {
            items: page.items,
            total: page.total,
        }
    }
}

/// 단순 메시지 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 요청 본문 유효성 검사. 실패 메시지를 모아 400 VALIDATION_ERROR로 반환합니다.
pub(crate) fn validate_request<T: Validate>(request: &T) -> ApiResult<()> {
    if let Err(errors) = request.validate() {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::validation(message));
    }
    Ok(())
}
