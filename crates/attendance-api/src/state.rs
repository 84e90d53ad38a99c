//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 시작 시 한 번 만들어져 `Arc`로 공유됩니다.
//! 설정과 저장소는 생성자를 통해서만 주입됩니다.

use std::sync::Arc;

use attendance_core::{AppConfig, Clock, SchoolResult, Stores};
use attendance_data::{Database, RedisSessionStore};

use crate::auth::{CredentialHasher, TokenIssuer};
use crate::services::{AbsenceWorkflow, AttendanceRecorder, Authenticator};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 불변 설정
    pub config: Arc<AppConfig>,

    /// 로그인/세션/자격증명 관리
    pub authenticator: Authenticator,

    /// 출석 체크/정정
    pub attendance: AttendanceRecorder,

    /// 결석 신청 워크플로우
    pub absence: AbsenceWorkflow,

    /// 데이터베이스 (헬스 체크용, 테스트에서는 없음)
    pub db: Option<Database>,

    /// 세션 캐시 (헬스 체크용, 테스트에서는 없음)
    pub redis: Option<RedisSessionStore>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// 서버 버전
    pub version: String,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("has_db", &self.db.is_some())
            .field("has_redis", &self.redis.is_some())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// 설정과 저장소로 서비스를 구성합니다.
    ///
    /// # Errors
    ///
    /// 서명 키나 argon2 파라미터가 잘못되면 `SchoolError::Configuration`.
    pub fn new(config: AppConfig, stores: Stores, clock: Arc<dyn Clock>) -> SchoolResult<Self> {
        let tokens = Arc::new(TokenIssuer::from_config(&config.auth)?);
        let hasher = Arc::new(CredentialHasher::new(&config.auth.argon2)?);

        let authenticator = Authenticator::new(
            Arc::clone(&stores.credentials),
            Arc::clone(&stores.sessions),
            tokens,
            hasher,
            Arc::clone(&clock),
        );
        let attendance = AttendanceRecorder::new(
            authenticator.clone(),
            Arc::clone(&stores.attendance),
            Arc::clone(&stores.directory),
            Arc::clone(&clock),
            config.school.timezone,
        );
        let absence = AbsenceWorkflow::new(
            Arc::clone(&stores.absence_requests),
            Arc::clone(&stores.directory),
            clock,
            config.school.date_format.clone(),
            config.pagination.clone(),
            config.workflow.enforce_teacher_class_scope,
        );

        Ok(Self {
            config: Arc::new(config),
            authenticator,
            attendance,
            absence,
            db: None,
            redis: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn with_database(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_redis(mut self, redis: RedisSessionStore) -> Self {
        self.redis = Some(redis);
        self
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db {
            Some(db) => matches!(db.health_check().await, Ok(true)),
            None => false,
        }
    }

    /// Redis 연결 상태 확인.
    pub async fn is_redis_healthy(&self) -> bool {
        match &self.redis {
            Some(redis) => matches!(redis.health_check().await, Ok(true)),
            None => false,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.auth.cookie_name
    }
}

/// 메모리 저장소와 2024-03-01 09:00 WIB에 고정된 시계로 만든 상태.
#[cfg(test)]
pub(crate) fn create_test_state() -> Arc<AppState> {
    use chrono::TimeZone;

    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("unit-test-signing-key-at-least-32-chars".into());
    let clock = attendance_core::FixedClock::new(
        chrono::Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap(),
    );
    let store = attendance_data::InMemoryStore::new();
    Arc::new(AppState::new(config, store.stores(), Arc::new(clock)).unwrap())
}
