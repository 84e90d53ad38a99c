//! 통합 테스트 공용 하네스.
//!
//! 메모리 저장소와 고정 시계로 `AppState`를 구성합니다.

#![allow(dead_code)]

use std::sync::Arc;

use attendance_api::auth::CredentialHasher;
use attendance_api::routes::create_api_router;
use attendance_api::state::AppState;
use attendance_core::{AppConfig, Argon2Config, Clock, FixedClock, Identity, Principal, Role};
use attendance_data::InMemoryStore;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

pub const STUDENT_ID: &str = "NIS-1001";
pub const STUDENT_PW: &str = "student-pass-1";
pub const OTHER_STUDENT_ID: &str = "NIS-1002";
pub const TEACHER_ID: &str = "NIP-2001";
pub const OTHER_TEACHER_ID: &str = "NIP-2002";
pub const TEACHER_PW: &str = "teacher-pass-1";
pub const ADMIN_ID: &str = "admin@school.test";
pub const ADMIN_PW: &str = "admin-pass-1";

/// 2024-03-01 09:00 WIB.
pub fn school_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap()
}

pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("integration-secret-key-at-least-32-characters".into());
    config.auth.argon2 = Argon2Config {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
    };
    config.auth.cookie_secure = false;
    config
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    hasher: CredentialHasher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let hasher = CredentialHasher::new(&config.auth.argon2).unwrap();
        let store = InMemoryStore::new();
        let clock = Arc::new(FixedClock::new(school_morning()));
        let state = AppState::new(config, store.stores(), clock.clone() as Arc<dyn Clock>).unwrap();

        Self {
            state: Arc::new(state),
            store,
            clock,
            hasher,
        }
    }

    pub async fn seed(
        &self,
        role: Role,
        identity_key: &str,
        name: &str,
        password: &str,
        active: bool,
    ) -> Principal {
        let hash = self.hasher.hash(password).unwrap();
        self.store
            .add_principal(role, identity_key, name, &hash, active)
            .await
    }

    /// 학생 두 명, 교사 두 명, 관리자 한 명. 첫 학생은 첫 교사가 담임인 학급에 배정됩니다.
    pub async fn seed_school(&self) -> uuid::Uuid {
        self.seed(Role::Student, STUDENT_ID, "Budi", STUDENT_PW, true)
            .await;
        self.seed(Role::Student, OTHER_STUDENT_ID, "Siti", STUDENT_PW, true)
            .await;
        self.seed(Role::Teacher, TEACHER_ID, "Pak Andi", TEACHER_PW, true)
            .await;
        self.seed(Role::Teacher, OTHER_TEACHER_ID, "Bu Rina", TEACHER_PW, true)
            .await;
        self.seed(Role::Admin, ADMIN_ID, "Admin", ADMIN_PW, true)
            .await;

        let class_id = uuid::Uuid::new_v4();
        self.store.assign_class(STUDENT_ID, class_id).await;
        self.store.set_homeroom(class_id, TEACHER_ID).await;
        class_id
    }

    pub fn router(&self) -> Router {
        create_api_router().with_state(self.state.clone())
    }

    /// HTTP 로그인 후 토큰 반환.
    pub async fn login_token(&self, role: Role, user_id: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({
                    "user_type": role.as_str(),
                    "user_id": user_id,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

pub fn identity(role: Role, identity_key: &str) -> Identity {
    Identity::new(role, identity_key)
}
