//! 결석 신청 endpoint.
//!
//! - `POST /absent-requests` - 제출 (학생)
//! - `GET /absent-requests/pending` - 대기 목록
//! - `GET /absent-requests/student-id/{id}` - 학생별 목록
//! - `GET /absent-requests/class-id/{id}` - 학급별 목록
//! - `GET /absent-requests/teacher-id/{id}` - 담임 학급 목록
//! - `GET|PUT|DELETE /absent-requests/{id}` - 조회/본인 수정/삭제
//! - `PUT /absent-requests/{id}/approve|reject` - 결정 (교사)

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use attendance_core::{AbsenceRequest, Decision};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{validate_request, AbsenceRequestList, ListQuery, MessageResponse};
use crate::auth::{AuthSession, StudentAuth, TeacherAuth};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::AbsenceUpdate;
use crate::state::AppState;

/// 결석 신청 제출 요청. 상태 필드는 받지 않으며 항상 대기로 저장됩니다.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAbsenceRequest {
    /// 결석 날짜 (YYYY-MM-DD)
    #[validate(length(min = 1, message = "request_date는 필수입니다"))]
    pub request_date: String,
    #[validate(length(min = 1, max = 1000, message = "reason은 1-1000자여야 합니다"))]
    pub reason: String,
}

/// 결석 신청 수정 요청.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAbsenceRequest {
    /// 결석 날짜 (YYYY-MM-DD)
    pub request_date: Option<String>,
    #[validate(length(max = 1000, message = "reason은 1000자 이하여야 합니다"))]
    pub reason: Option<String>,
}

/// 결석 신청 제출.
#[utoipa::path(
    post,
    path = "/absent-requests",
    tag = "absent-requests",
    request_body = CreateAbsenceRequest,
    responses(
        (status = 201, description = "제출됨 (status=pending)", body = AbsenceRequest),
        (status = 400, description = "날짜 형식 오류, 빈 사유 또는 필드 누락", body = ApiErrorResponse),
        (status = 403, description = "학생 전용", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    StudentAuth(student): StudentAuth,
    ApiJson(request): ApiJson<CreateAbsenceRequest>,
) -> ApiResult<(StatusCode, Json<AbsenceRequest>)> {
    validate_request(&request)?;
    let created = state
        .absence
        .create(&student, &request.request_date, &request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// 본인 신청 수정 (대기 상태만).
#[utoipa::path(
    put,
    path = "/absent-requests/{id}",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "결석 신청 ID")),
    request_body = UpdateAbsenceRequest,
    responses(
        (status = 200, description = "수정된 신청", body = AbsenceRequest),
        (status = 403, description = "본인 신청 아님", body = ApiErrorResponse),
        (status = 404, description = "신청 없음", body = ApiErrorResponse),
        (status = 409, description = "대기 상태 아님", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    StudentAuth(student): StudentAuth,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateAbsenceRequest>,
) -> ApiResult<Json<AbsenceRequest>> {
    validate_request(&request)?;
    let updated = state
        .absence
        .update_own(
            id,
            &student,
            AbsenceUpdate {
                request_date: request.request_date,
                reason: request.reason,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// 승인.
#[utoipa::path(
    put,
    path = "/absent-requests/{id}/approve",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "결석 신청 ID")),
    responses(
        (status = 200, description = "승인됨", body = AbsenceRequest),
        (status = 403, description = "교사 전용", body = ApiErrorResponse),
        (status = 404, description = "신청 없음", body = ApiErrorResponse),
        (status = 409, description = "대기 상태 아님", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    TeacherAuth(teacher): TeacherAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AbsenceRequest>> {
    let decided = state
        .absence
        .decide(id, &teacher, Decision::Approve)
        .await?;
    Ok(Json(decided))
}

/// 반려.
#[utoipa::path(
    put,
    path = "/absent-requests/{id}/reject",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "결석 신청 ID")),
    responses(
        (status = 200, description = "반려됨", body = AbsenceRequest),
        (status = 403, description = "교사 전용", body = ApiErrorResponse),
        (status = 404, description = "신청 없음", body = ApiErrorResponse),
        (status = 409, description = "대기 상태 아님", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    TeacherAuth(teacher): TeacherAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AbsenceRequest>> {
    let decided = state
        .absence
        .decide(id, &teacher, Decision::Reject)
        .await?;
    Ok(Json(decided))
}

/// 단건 조회.
#[utoipa::path(
    get,
    path = "/absent-requests/{id}",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "결석 신청 ID")),
    responses(
        (status = 200, description = "결석 신청", body = AbsenceRequest),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "신청 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AbsenceRequest>> {
    Ok(Json(state.absence.get(id, &identity).await?))
}

/// 삭제 (soft delete, 교사/관리자).
#[utoipa::path(
    delete,
    path = "/absent-requests/{id}",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "결석 신청 ID")),
    responses(
        (status = 200, description = "삭제됨", body = MessageResponse),
        (status = 403, description = "교사/관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "신청 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.absence.soft_delete(id, &identity).await?;
    Ok(Json(MessageResponse::new("결석 신청이 삭제되었습니다")))
}

/// 대기 목록.
#[utoipa::path(
    get,
    path = "/absent-requests/pending",
    tag = "absent-requests",
    params(ListQuery),
    responses(
        (status = 200, description = "대기 중인 신청 (최신순)", body = AbsenceRequestList),
        (status = 403, description = "교사/관리자 전용", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<AbsenceRequestList>> {
    let page = state
        .absence
        .list_pending(&identity, query.limit, query.offset)
        .await?;
    Ok(Json(page.into()))
}

/// 학생별 목록. 학생은 본인 NIS만 조회할 수 있습니다.
#[utoipa::path(
    get,
    path = "/absent-requests/student-id/{id}",
    tag = "absent-requests",
    params(("id" = String, Path, description = "학생 NIS"), ListQuery),
    responses(
        (status = 200, description = "학생의 신청 (최신순)", body = AbsenceRequestList),
        (status = 403, description = "권한 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_by_student(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(student_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<AbsenceRequestList>> {
    let page = state
        .absence
        .list_by_student(&student_id, &identity, query.limit, query.offset)
        .await?;
    Ok(Json(page.into()))
}

/// 학급별 목록.
#[utoipa::path(
    get,
    path = "/absent-requests/class-id/{id}",
    tag = "absent-requests",
    params(("id" = Uuid, Path, description = "학급 ID"), ListQuery),
    responses(
        (status = 200, description = "학급의 신청 (최신순)", body = AbsenceRequestList),
        (status = 403, description = "교사/관리자 전용", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_by_class(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(class_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<AbsenceRequestList>> {
    let page = state
        .absence
        .list_by_class(class_id, &identity, query.limit, query.offset)
        .await?;
    Ok(Json(page.into()))
}

/// 교사가 담임인 학급의 목록.
#[utoipa::path(
    get,
    path = "/absent-requests/teacher-id/{id}",
    tag = "absent-requests",
    params(("id" = String, Path, description = "교사 NIP"), ListQuery),
    responses(
        (status = 200, description = "담임 학급의 신청 (최신순)", body = AbsenceRequestList),
        (status = 403, description = "교사/관리자 전용", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_by_teacher(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiPath(teacher_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<AbsenceRequestList>> {
    let page = state
        .absence
        .list_by_teacher(&teacher_id, &identity, query.limit, query.offset)
        .await?;
    Ok(Json(page.into()))
}

/// 결석 신청 라우터 생성.
///
/// 고정 경로(`/pending`)는 `/{id}`보다 우선 매칭됩니다.
pub fn absence_requests_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_request))
        .route("/pending", get(list_pending))
        .route("/student-id/{id}", get(list_by_student))
        .route("/class-id/{id}", get(list_by_class))
        .route("/teacher-id/{id}", get(list_by_teacher))
        .route(
            "/{id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/{id}/approve", put(approve_request))
        .route("/{id}/reject", put(reject_request))
}
