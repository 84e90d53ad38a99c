//! Axum용 세션 인증 추출기.
//!
//! `Authorization: Bearer <token>` 헤더 또는 세션 쿠키에서 토큰을 읽어
//! 세션 캐시와 대조한 뒤 호출자 신원을 핸들러에 전달합니다.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use attendance_core::{Identity, Role, SchoolError};

use crate::error::ApiError;
use crate::state::AppState;

/// 인증된 호출자.
///
/// ```rust,ignore
/// async fn protected_handler(AuthSession(identity): AuthSession) -> impl IntoResponse {
///     format!("Hello, {}!", identity.identity_key)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, state.cookie_name())
            .ok_or_else(|| SchoolError::Unauthenticated("missing token".to_string()))?;

        let identity = state.authenticator.resolve(&token).await?;
        Ok(AuthSession(identity))
    }
}

/// 지정한 역할만 통과시킵니다.
pub fn require_role(role: Role, identity: &Identity) -> Result<(), ApiError> {
    if identity.role == role {
        Ok(())
    } else {
        Err(SchoolError::Unauthorized(format!("{} 권한이 필요합니다", role)).into())
    }
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub Identity);

        impl FromRequestParts<Arc<AppState>> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &Arc<AppState>,
            ) -> Result<Self, Self::Rejection> {
                let AuthSession(identity) = AuthSession::from_request_parts(parts, state).await?;
                require_role($role, &identity)?;
                Ok($name(identity))
            }
        }
    };
}

role_extractor!(
    /// 관리자 전용 추출기.
    AdminAuth,
    Role::Admin
);
role_extractor!(
    /// 교사 전용 추출기.
    TeacherAuth,
    Role::Teacher
);
role_extractor!(
    /// 학생 전용 추출기.
    StudentAuth,
    Role::Student
);

/// Bearer 헤더를 우선하고, 없으면 쿠키에서 토큰을 읽습니다.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => parse_cookie(headers, cookie_name),
    }
}

/// `Cookie` 헤더에서 이름이 일치하는 값을 찾습니다.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let mut kv = pair.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some(k), Some(v)) if k == name && !v.is_empty() => Some(v.to_string()),
                _ => None,
            }
        })
        .next()
}

/// 세션 쿠키 (HttpOnly, SameSite=Strict).
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={token}; HttpOnly{secure}; SameSite=Strict; Path=/; Max-Age={max_age_secs}"
    ))
    .ok()
}

/// 세션 쿠키 삭제.
pub fn clear_session_cookie(name: &str, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly{secure}; SameSite=Strict; Path=/"
    ))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=cookie-token"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=xyz.abc.def; lang=id"),
        );
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("xyz.abc.def"));
        assert_eq!(extract_token(&headers, "session"), None);
    }

    #[test]
    fn test_extract_token_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_token(&headers, "token"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token", "abc", 3600, true).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("token=abc;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=3600"));

        let cleared = clear_session_cookie("token", false).unwrap();
        let value = cleared.to_str().unwrap();
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_require_role() {
        let teacher = Identity::new(Role::Teacher, "T1");
        assert!(require_role(Role::Teacher, &teacher).is_ok());

        let err = require_role(Role::Admin, &teacher).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.code, "UNAUTHORIZED");
    }
}
