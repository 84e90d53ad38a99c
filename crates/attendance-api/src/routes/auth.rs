//! 인증 endpoint.
//!
//! - `POST /auth/login` - 로그인 (토큰 + 세션 쿠키)
//! - `POST /auth/logout` - 로그아웃
//! - `PUT /auth/password` - 본인 비밀번호 변경

use std::sync::Arc;

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use attendance_core::{Role, SchoolError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_request, MessageResponse};
use crate::auth::{clear_session_cookie, session_cookie, AuthSession};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// 사용자 유형 (admin, teacher, student)
    #[validate(length(min = 1, message = "user_type은 필수입니다"))]
    pub user_type: String,
    /// 식별 키 (관리자: 이메일, 교사: NIP, 학생: NIS)
    #[validate(length(min = 1, max = 255, message = "user_id는 1-255자여야 합니다"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "password는 필수입니다"))]
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user_type: Role,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// 비밀번호 변경 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current_password는 필수입니다"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "new_password는 필수입니다"))]
    pub new_password: String,
}

/// 로그인.
///
/// 응답 본문의 토큰과 같은 값이 HttpOnly 쿠키로도 설정됩니다.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "잘못된 요청", body = ApiErrorResponse),
        (status = 401, description = "자격증명 불일치 또는 비활성 계정", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    validate_request(&request)?;
    let role: Role = request.user_type.parse()?;

    let session = state
        .authenticator
        .login(role, request.user_id.trim(), &request.password)
        .await?;

    let cookie = session_cookie(
        state.cookie_name(),
        &session.token,
        state.config.auth.session_ttl_secs,
        state.config.auth.cookie_secure,
    )
    .ok_or_else(|| SchoolError::Internal("세션 쿠키 생성 실패".to_string()))?;

    let mut response = Json(LoginResponse {
        token: session.token,
        user_type: session.role,
        user_id: session.identity_key,
        expires_at: session.expires_at,
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// 로그아웃. 세션을 삭제하고 쿠키를 만료시킵니다.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "로그아웃 완료", body = MessageResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
) -> ApiResult<Response> {
    state
        .authenticator
        .logout(identity.role, &identity.identity_key)
        .await?;

    let mut response = Json(MessageResponse::new("로그아웃되었습니다")).into_response();
    if let Some(cookie) = clear_session_cookie(state.cookie_name(), state.config.auth.cookie_secure)
    {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// 본인 비밀번호 변경. 성공하면 다시 로그인해야 합니다.
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "변경 완료", body = MessageResponse),
        (status = 400, description = "비밀번호 강도 미달", body = ApiErrorResponse),
        (status = 401, description = "현재 비밀번호 불일치", body = ApiErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthSession(identity): AuthSession,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_request(&request)?;

    state
        .authenticator
        .change_password(
            identity.role,
            &identity.identity_key,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(Json(MessageResponse::new(
        "비밀번호가 변경되었습니다. 다시 로그인하세요",
    )))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password", put(change_password))
}
