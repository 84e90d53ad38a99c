//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 도메인 에러(`SchoolError`)는 [`ApiError`]를 거쳐 HTTP 상태 코드로 변환됩니다.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use attendance_core::SchoolError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_PENDING",
///   "message": "결석 신청이 대기 상태가 아닙니다",
///   "timestamp": 1709254800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "NOT_FOUND", "ALREADY_MARKED")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

/// 도메인 에러의 HTTP 상태 코드.
pub fn status_for(err: &SchoolError) -> StatusCode {
    match err {
        SchoolError::InvalidDate(_) | SchoolError::Validation(_) => StatusCode::BAD_REQUEST,
        SchoolError::InvalidCredentials
        | SchoolError::AccountDeactivated
        | SchoolError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        SchoolError::Unauthorized(_) => StatusCode::FORBIDDEN,
        SchoolError::NotFound(_) => StatusCode::NOT_FOUND,
        SchoolError::NotPending | SchoolError::AlreadyMarked => StatusCode::CONFLICT,
        SchoolError::Configuration(_) | SchoolError::Storage(_) | SchoolError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 핸들러 에러. 상태 코드와 JSON 본문으로 응답합니다.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ApiErrorResponse) -> Self {
        Self { status, body }
    }

    /// 400 VALIDATION_ERROR.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorResponse::new("VALIDATION_ERROR", message),
        )
    }
}

impl From<SchoolError> for ApiError {
    fn from(err: SchoolError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            // 내부 정보는 로그에만 남김
            tracing::error!(code = err.code(), error = %err, "Request failed");
            return Self::new(
                status,
                ApiErrorResponse::new(err.code(), "내부 서버 오류가 발생했습니다"),
            );
        }
        Self::new(status, ApiErrorResponse::new(err.code(), err.to_string()))
    }
}

/// 추출기 거부 응답.
///
/// 본문/쿼리/경로 해석 실패는 모두 400 VALIDATION_ERROR입니다.
/// 콘텐츠 타입 누락(415)이나 본문 크기 초과(413)처럼 형식과 무관한 거부는
/// 원래 상태 코드를 유지합니다.
fn rejected(status: StatusCode, message: String) -> ApiError {
    tracing::debug!(status = status.as_u16(), message = %message, "Request rejected by extractor");
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::validation(message),
        other => ApiError::new(other, ApiErrorResponse::new("INVALID_REQUEST", message)),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // 경로 매칭 실패 같은 서버 측 거부는 그대로 둠
        let status = rejection.status();
        if status.is_server_error() {
            tracing::error!(error = %rejection.body_text(), "Path extraction failed");
            return Self::from(SchoolError::Internal(rejection.body_text()));
        }
        rejected(status, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
///
/// ```ignore
/// async fn get_request(
///     Path(id): Path<Uuid>,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<AbsenceRequest>> {
///     let request = state.absence.get(id, &viewer).await?;
///     Ok(Json(request))
/// }
/// ```
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Resource not found");
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.message, "Resource not found");
        assert!(error.timestamp.is_some());

        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_rejection_status_mapping() {
        let api = rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field `request_date`".into());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.code, "VALIDATION_ERROR");
        assert!(api.body.message.contains("request_date"));

        let api = rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Expected JSON".into());
        assert_eq!(api.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(api.body.code, "INVALID_REQUEST");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SchoolError::InvalidDate("x".into()), StatusCode::BAD_REQUEST),
            (SchoolError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (SchoolError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (SchoolError::AccountDeactivated, StatusCode::UNAUTHORIZED),
            (SchoolError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (SchoolError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (SchoolError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SchoolError::NotPending, StatusCode::CONFLICT),
            (SchoolError::AlreadyMarked, StatusCode::CONFLICT),
            (SchoolError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SchoolError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SchoolError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{:?}", err);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let api: ApiError = SchoolError::Storage("connection refused at 10.0.0.3".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.code, "STORAGE_ERROR");
        assert!(!api.body.message.contains("10.0.0.3"));

        let api: ApiError = SchoolError::AlreadyMarked.into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.body.code, "ALREADY_MARKED");
    }
}
