//! 학교 출결 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - 세션 토큰 인증 (JWT + 세션 캐시 대조)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`services`]: 인증, 출석, 결석 신청 비즈니스 로직
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰, 비밀번호 해싱, 인증 추출기
//! - [`extract`]: 거부를 JSON 에러로 바꾸는 요청 추출기
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서

pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AdminAuth, AuthSession, Claims, CredentialHasher, StudentAuth, TeacherAuth, TokenIssuer};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_api_router;
pub use services::{AbsenceWorkflow, AttendanceRecorder, Authenticator};
pub use state::AppState;
