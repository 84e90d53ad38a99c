//! 요청 추출기.
//!
//! axum 기본 추출기를 감싸 거부(rejection)도 [`ApiError`] JSON 본문으로 응답합니다.
//! 핸들러는 `Json`/`Query`/`Path` 대신 이 타입들을 사용합니다.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{de, Deserialize, Deserializer};

use crate::error::ApiError;

/// JSON 본문. 필드 누락이나 타입 불일치는 400 VALIDATION_ERROR.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// 쿼리 문자열.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// 경로 파라미터. 잘못된 UUID 등은 400 VALIDATION_ERROR.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// 정수 쿼리 값을 `i64` 범위로 포화시켜 읽습니다.
///
/// 빈 값은 없는 것으로 보고, 범위를 넘는 숫자열은 `i64::MAX`/`i64::MIN`이 됩니다.
pub(crate) fn saturating_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_saturating(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("정수가 아닙니다: {}", value))),
    }
}

fn parse_saturating(value: &str) -> Option<i64> {
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}
