//! Prometheus 메트릭.
//!
//! HTTP 계층 지표와 출결 업무 지표를 기록하고 `/metrics`로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// 요청 처리 시간 버킷 (초). 로그인과 출석 체크는 argon2 검증 때문에 수백 ms가 정상입니다.
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

/// 라우트에 등장하는 고정 세그먼트. 나머지는 모두 `:id`로 묶어 라벨 수를 제한합니다.
const STATIC_SEGMENTS: &[&str] = &[
    "health",
    "ready",
    "auth",
    "login",
    "logout",
    "password",
    "attendance",
    "mark",
    "absent-requests",
    "pending",
    "student-id",
    "class-id",
    "teacher-id",
    "approve",
    "reject",
    "admin",
    "principals",
    "active",
    "teacher",
    "student",
    "api-docs",
    "openapi.json",
];

/// 전역 Prometheus 레코더를 설치합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 `BuildError`.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()
}

pub fn record_http_request(method: &str, route: &str) {
    counter!("http_requests_total", "method" => method.to_owned(), "path" => route.to_owned())
        .increment(1);
}

pub fn record_http_response(method: &str, route: &str, status: u16) {
    let class = match status {
        100..=399 => "ok",
        400..=499 => "client_error",
        _ => "server_error",
    };
    counter!(
        "http_responses_total",
        "method" => method.to_owned(),
        "path" => route.to_owned(),
        "status" => status.to_string(),
        "class" => class
    )
    .increment(1);
}

pub fn record_http_duration(method: &str, route: &str, secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_owned(),
        "path" => route.to_owned()
    )
    .record(secs);
}

/// 로그인 결과. `outcome`: success | invalid_credentials | deactivated | error
pub fn record_login(role: &str, outcome: &'static str) {
    counter!("auth_logins_total", "role" => role.to_owned(), "outcome" => outcome).increment(1);
}

/// 출석 체크 결과. `outcome`: marked | already_marked | rejected | error
pub fn record_attendance_mark(outcome: &'static str) {
    counter!("attendance_marks_total", "outcome" => outcome).increment(1);
}

/// 결석 신청 결정 (approve | reject).
pub fn record_absence_decision(decision: &'static str) {
    counter!("absence_requests_decided_total", "decision" => decision).increment(1);
}

/// 요청 경로를 메트릭 라벨로 바꿉니다.
///
/// `/absent-requests/student-id/NIS-1001` → `/absent-requests/student-id/:id`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.is_empty() || STATIC_SEGMENTS.contains(&segment) {
                segment
            } else {
                ":id"
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
