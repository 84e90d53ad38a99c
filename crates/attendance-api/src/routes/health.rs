//! 헬스 체크 endpoint.
//!
//! - `GET /health` - liveness (프로세스가 응답하는지만 확인)
//! - `GET /health/ready` - readiness (DB와 세션 캐시 확인)

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 전체 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// 의존성 하나의 상태.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentStatus {
    Up,
    Down { message: String },
    /// 테스트나 단독 실행처럼 연결이 없는 경우
    NotConfigured,
}

impl ComponentStatus {
    fn probe(configured: bool, healthy: bool) -> Self {
        match (configured, healthy) {
            (false, _) => ComponentStatus::NotConfigured,
            (true, true) => ComponentStatus::Up,
            (true, false) => ComponentStatus::Down {
                message: "연결 실패".to_string(),
            },
        }
    }

    fn is_down(&self) -> bool {
        matches!(self, ComponentStatus::Down { .. })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub database: ComponentStatus,
    pub session_cache: ComponentStatus,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_secs: i64,
    /// 학교 시간대
    pub timezone: String,
    /// 학교 시간대 기준 오늘 (출석 체크가 기록될 날짜)
    pub school_date: NaiveDate,
    pub components: ComponentHealth,
}

/// liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능"))
)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// readiness probe.
///
/// 로그인, 세션 확인, 모든 쓰기가 DB와 세션 캐시에 의존하므로
/// 설정된 의존성이 하나라도 내려가 있으면 503입니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "모든 의존성 정상", body = HealthResponse),
        (status = 503, description = "의존성 장애", body = HealthResponse)
    )
)]
pub async fn health_ready(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (db_ok, cache_ok) = tokio::join!(state.is_db_healthy(), state.is_redis_healthy());
    let components = ComponentHealth {
        database: ComponentStatus::probe(state.db.is_some(), db_ok),
        session_cache: ComponentStatus::probe(state.redis.is_some(), cache_ok),
    };

    let degraded = components.database.is_down() || components.session_cache.is_down();
    let (status, code) = if degraded {
        (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    } else {
        (HealthStatus::Healthy, StatusCode::OK)
    };

    let tz = state.config.school.timezone;
    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timezone: tz.name().to_string(),
        school_date: chrono::Utc::now().with_timezone(&tz).date_naive(),
        components,
    };

    (code, Json(response))
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
