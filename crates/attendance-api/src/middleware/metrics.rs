//! HTTP 요청 메트릭 수집.

use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 이 시간을 넘긴 요청은 경고 로그를 남깁니다.
const SLOW_REQUEST: Duration = Duration::from_secs(1);

/// 수집하지 않는 경로 (스크레이프 자체).
const UNTRACKED_PATHS: &[&str] = &["/metrics"];

/// 요청 수, 응답 상태, 처리 시간을 기록하는 미들웨어.
///
/// 라벨은 가능하면 라우트 템플릿(`/absent-requests/{id}`)을 쓰고,
/// 매칭 정보가 없으면 ID 세그먼트를 정규화한 경로를 씁니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    if UNTRACKED_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().clone();
    let route = route_label(&request);

    record_http_request(method.as_str(), &route);
    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    record_http_response(method.as_str(), &route, status);
    record_http_duration(method.as_str(), &route, elapsed.as_secs_f64());

    if elapsed >= SLOW_REQUEST {
        warn!(%method, route = %route, status, elapsed_ms = elapsed.as_millis() as u64, "Slow request");
    }

    response
}

fn route_label(request: &Request) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, StatusCode},
        middleware,
        routing::{get, put},
        Router,
    };
    use tower::ServiceExt;

    async fn ok() -> &'static str {
        "OK"
    }

    #[test]
    fn test_route_label_falls_back_to_normalized_path() {
        let request = Request::builder()
            .uri("/attendance/123e4567-e89b-12d3-a456-426614174000")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), "/attendance/:id");
    }

    #[tokio::test]
    async fn test_layer_passes_response_through() {
        let app = Router::new()
            .route("/absent-requests/{id}/approve", put(ok))
            .route_layer(middleware::from_fn(metrics_layer));

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/absent-requests/123e4567-e89b-12d3-a456-426614174000/approve")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_is_untracked() {
        let app = Router::new()
            .route("/metrics", get(ok))
            .layer(middleware::from_fn(metrics_layer));

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
