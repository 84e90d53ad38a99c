//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성하고
//! `/api-docs/openapi.json`으로 제공합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use attendance_core::{
    AbsenceRequest, AttendancePatch, AttendanceRecord, AttendanceStatus, RequestStatus, Role,
};

use crate::error::ApiErrorResponse;
use crate::routes::{
    AbsenceRequestList, ChangePasswordRequest, ComponentHealth, ComponentStatus,
    CreateAbsenceRequest, HealthResponse, HealthStatus, LoginRequest, LoginResponse, MarkAttendanceRequest,
    MarkAttendanceResponse, MessageResponse, ResetPasswordRequest, SetActiveRequest,
    UpdateAbsenceRequest,
};

/// 세션 토큰 보안 스키마 등록.
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Attendance API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance API",
        version = "0.1.0",
        description = r#"
# 학교 출결 REST API

## 주요 기능

- **인증**: 관리자/교사/학생 로그인, 세션 토큰
- **출석**: 학생 본인 출석 체크 (하루 한 번), 관리자 정정
- **결석 신청**: 학생 제출, 교사 승인/반려

## 인증

`POST /auth/login`이 반환한 토큰을 `Authorization: Bearer <token>` 헤더로
보내거나, 함께 설정되는 `token` 쿠키를 사용하세요.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 로그인/로그아웃/비밀번호"),
        (name = "attendance", description = "출석 - 체크/정정/삭제"),
        (name = "absent-requests", description = "결석 신청 - 제출/수정/결정/목록"),
        (name = "admin", description = "관리 - 계정 비밀번호/활성 상태")
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,
            MessageResponse,

            // ===== Health =====
            HealthResponse,
            HealthStatus,
            ComponentHealth,
            ComponentStatus,

            // ===== Auth =====
            Role,
            LoginRequest,
            LoginResponse,
            ChangePasswordRequest,

            // ===== Attendance =====
            AttendanceStatus,
            AttendanceRecord,
            AttendancePatch,
            MarkAttendanceRequest,
            MarkAttendanceResponse,

            // ===== Absence requests =====
            RequestStatus,
            AbsenceRequest,
            AbsenceRequestList,
            CreateAbsenceRequest,
            UpdateAbsenceRequest,

            // ===== Admin =====
            ResetPasswordRequest,
            SetActiveRequest,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::change_password,

        // ===== Attendance =====
        crate::routes::attendance::mark_attendance,
        crate::routes::attendance::get_attendance,
        crate::routes::attendance::update_attendance,
        crate::routes::attendance::delete_attendance,

        // ===== Absence requests =====
        crate::routes::absence_requests::create_request,
        crate::routes::absence_requests::update_request,
        crate::routes::absence_requests::approve_request,
        crate::routes::absence_requests::reject_request,
        crate::routes::absence_requests::get_request,
        crate::routes::absence_requests::delete_request,
        crate::routes::absence_requests::list_pending,
        crate::routes::absence_requests::list_by_student,
        crate::routes::absence_requests::list_by_class,
        crate::routes::absence_requests::list_by_teacher,

        // ===== Admin =====
        crate::routes::admin::reset_password,
        crate::routes::admin::set_active,
    )
)]
pub struct ApiDoc;

/// OpenAPI JSON 라우터 생성.
///
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
