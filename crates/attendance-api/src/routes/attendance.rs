//! 출석 endpoint.
//!
//! - `POST /attendance/mark` - 학생 본인 출석 체크 (비밀번호 재확인)
//! - `GET /attendance/{id}` - 기록 조회
//! - `PUT /attendance/{id}` - 관리자 정정
//! - `DELETE /attendance/{id}` - soft delete (교사/관리자)

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use attendance_core::{AttendancePatch, AttendanceRecord, Role, SchoolError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{validate_request, MessageResponse};
use crate::auth::{AdminAuth, AuthSession};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// 출석 체크 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceRequest {
    /// 학생 NIS
    #[validate(length(min = 1, max = 64, message = "student_id는 1-64자여야 합니다"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "password는 필수입니다"))]
    pub password: String,
}

/// 출석 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub student_name: String,
    pub message: String,
    pub attendance: AttendanceRecord,
}

/// 학생 본인 출석 체크.
///
/// 세션 없이 학생 NIS와 비밀번호로 호출합니다. 같은 날 두 번째 호출은 409.
#[utoipa::path(
    post,
    path = "/attendance/mark",
    tag = "attendance",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 201, description = "출석 처리됨", body = MarkAttendanceResponse),
        (status = 400, description = "필드 누락 또는 형식 오류", body = ApiErrorResponse),
        (status = 401, description = "자격증명 불일치 또는 비활성 계정", body = ApiErrorResponse),
        (status = 409, description = "오늘 이미 출석함", body = ApiErrorResponse)
    )
)]
pub async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<MarkAttendanceRequest>,
) -> ApiResult<(StatusCode, Json<MarkAttendanceResponse>)> {
    validate_request(&request)?;

    let marked = state
        .attendance
        .mark_self(request.student_id.trim(), &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MarkAttendanceResponse {
            message: format!("{}님 출석이 처리되었습니다", marked.student_name),
            student_name: marked.student_name,
            attendance: marked.record,
        }),
    ))
}

/// 출석 기록 조회. 학생은 본인 기록만 볼 수 있습니다.
#[utoipa::path(
    get,
    path = "/attendance/{id}",
    tag = "attendance",
    params(("id" = Uuid, Path, description = "출석 기록 ID")),
    responses(
        (status = 200, description = "출석 기록", body = AttendanceRecord),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "기록 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn get_attendance(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AttendanceRecord>> {
    let record = state.attendance.get(id).await?;
    if identity.role == Role::Student && record.student_id != identity.identity_key {
        return Err(SchoolError::Unauthorized("본인의 출석 기록만 조회할 수 있습니다".to_string()).into());
    }
    Ok(Json(record))
}

/// 관리자 출석 정정.
#[utoipa::path(
    put,
    path = "/attendance/{id}",
    tag = "attendance",
    params(("id" = Uuid, Path, description = "출석 기록 ID")),
    request_body = AttendancePatch,
    responses(
        (status = 200, description = "정정된 기록", body = AttendanceRecord),
        (status = 400, description = "빈 패치 또는 잘못된 시간", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "기록 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn update_attendance(
    State(state): State<Arc<AppState>>,
    AdminAuth(admin): AdminAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AttendancePatch>,
) -> ApiResult<Json<AttendanceRecord>> {
    let record = state.attendance.update(id, &patch, &admin).await?;
    Ok(Json(record))
}

/// 출석 기록 삭제 (soft delete).
#[utoipa::path(
    delete,
    path = "/attendance/{id}",
    tag = "attendance",
    params(("id" = Uuid, Path, description = "출석 기록 ID")),
    responses(
        (status = 200, description = "삭제됨", body = MessageResponse),
        (status = 403, description = "교사/관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "기록 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn delete_attendance(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.attendance.soft_delete(id, &identity).await?;
    Ok(Json(MessageResponse::new("출석 기록이 삭제되었습니다")))
}

/// 출석 라우터 생성.
pub fn attendance_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mark", post(mark_attendance))
        .route(
            "/{id}",
            get(get_attendance)
                .put(update_attendance)
                .delete(delete_attendance),
        )
}
