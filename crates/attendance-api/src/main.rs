//! 학교 출결 API 서버.
//!
//! 설정을 한 번 로드해 Postgres/Redis 저장소와 서비스를 구성한 뒤
//! Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use attendance_api::metrics::setup_metrics_recorder;
use attendance_api::middleware::metrics_layer;
use attendance_api::openapi::openapi_router;
use attendance_api::routes::create_api_router;
use attendance_api::state::AppState;
use attendance_core::{init_logging, AppConfig, ServerConfig, Stores, SystemClock};
use attendance_data::{
    Database, PgAbsenceRequestStore, PgAttendanceStore, PgCredentialStore, PgStudentDirectory,
    RedisSessionStore,
};

/// CORS 레이어 생성.
///
/// `server.cors_origins`가 비어 있으면 모든 origin을 허용합니다 (개발용).
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("server.cors_origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 쿠키 세션은 origin이 지정된 경우에만 허용
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors_layer(&state.config.server);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .merge(openapi_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 요청 제한 시간 초과 시 408, 진행 중인 저장소 호출은 future drop으로 취소됨
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(cors)
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그가 있으면 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use attendance_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    if std::env::args().any(|arg| arg == "--export-openapi") {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        return Ok(true);
    }
    Ok(false)
}

/// Postgres/Redis 저장소 연결.
async fn connect_stores(config: &AppConfig) -> anyhow::Result<(Stores, Database, RedisSessionStore)> {
    let db = Database::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    if config.database.run_migrations {
        db.migrate().await.context("마이그레이션 실패")?;
        info!("Database migrations applied");
    }

    let redis_url = config
        .redis
        .url
        .as_deref()
        .context("redis.url is not set")?;
    let sessions = RedisSessionStore::connect(redis_url, config.redis.session_key_prefix.clone())
        .await
        .context("Redis 연결 실패")?;

    let stores = Stores {
        credentials: Arc::new(PgCredentialStore::new(db.clone())),
        sessions: Arc::new(sessions.clone()),
        directory: Arc::new(PgStudentDirectory::new(db.clone())),
        attendance: Arc::new(PgAttendanceStore::new(db.clone())),
        absence_requests: Arc::new(PgAbsenceRequestStore::new(db.clone())),
    };

    Ok((stores, db, sessions))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("설정 로드 실패")?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting attendance API server...");

    let metrics_handle = setup_metrics_recorder().context("Prometheus 레코더 설치 실패")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("server.host/server.port가 유효하지 않습니다")?;

    let (stores, db, sessions) = connect_stores(&config).await?;
    let state = Arc::new(
        AppState::new(config, stores, Arc::new(SystemClock))
            .context("서비스 구성 실패")?
            .with_database(db)
            .with_redis(sessions),
    );
    info!(version = %state.version, timezone = %state.config.school.timezone, "Application state initialized");

    let app = create_router(state, metrics_handle);

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환되어 진행 중인 요청을 마무리합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
