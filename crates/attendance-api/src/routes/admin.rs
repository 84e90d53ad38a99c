//! 관리자 계정 관리 endpoint.
//!
//! - `PUT /admin/principals/{role}/{id}/password` - 비밀번호 초기화
//! - `PUT /admin/principals/{role}/{id}/active` - 활성화/비활성화

use std::sync::Arc;

use axum::{
    extract::State,
    routing::put,
    Json, Router,
};
use attendance_core::{Permission, Role};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_request, MessageResponse};
use crate::auth::AdminAuth;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::services::ensure_permission;
use crate::state::AppState;

/// 비밀번호 초기화 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "new_password는 필수입니다"))]
    pub new_password: String,
}

/// 활성 플래그 변경 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// 비밀번호 초기화. 대상 사용자의 세션도 삭제됩니다.
#[utoipa::path(
    put,
    path = "/admin/principals/{role}/{id}/password",
    tag = "admin",
    params(
        ("role" = String, Path, description = "admin | teacher | student"),
        ("id" = String, Path, description = "식별 키 (이메일/NIP/NIS)")
    ),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "초기화됨", body = MessageResponse),
        (status = 400, description = "비밀번호 강도 미달", body = ApiErrorResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    AdminAuth(admin): AdminAuth,
    ApiPath((role, identity_key)): ApiPath<(String, String)>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ensure_permission(&admin, Permission::ManagePrincipals)?;
    validate_request(&request)?;
    let role: Role = role.parse()?;

    state
        .authenticator
        .reset_password(role, &identity_key, &request.new_password)
        .await?;

    Ok(Json(MessageResponse::new("비밀번호가 초기화되었습니다")))
}

/// 계정 활성화/비활성화. 비활성화하면 세션도 삭제됩니다.
#[utoipa::path(
    put,
    path = "/admin/principals/{role}/{id}/active",
    tag = "admin",
    params(
        ("role" = String, Path, description = "admin | teacher | student"),
        ("id" = String, Path, description = "식별 키 (이메일/NIP/NIS)")
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "변경됨", body = MessageResponse),
        (status = 403, description = "관리자 전용", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    AdminAuth(admin): AdminAuth,
    ApiPath((role, identity_key)): ApiPath<(String, String)>,
    ApiJson(request): ApiJson<SetActiveRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ensure_permission(&admin, Permission::ManagePrincipals)?;
    let role: Role = role.parse()?;

    state
        .authenticator
        .set_active(role, &identity_key, request.active)
        .await?;

    let message = if request.active {
        "계정이 활성화되었습니다"
    } else {
        "계정이 비활성화되었습니다"
    };
    Ok(Json(MessageResponse::new(message)))
}

/// 관리자 라우터 생성.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/principals/{role}/{id}/password", put(reset_password))
        .route("/principals/{role}/{id}/active", put(set_active))
}
