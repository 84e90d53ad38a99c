//! 로깅 초기화.
//!
//! `logging.format`에 따라 출력 레이어 하나만 활성화합니다.
//! `RUST_LOG`가 있으면 `logging.level`보다 우선합니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// 필터가 비어 있을 때 사용하는 기본 지시어.
const FALLBACK_DIRECTIVE: &str = "info";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 개발용 여러 줄 출력
    #[default]
    Pretty,
    /// 로그 수집기용
    Json,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("지원하지 않는 로그 형식: {} (pretty|json|compact)", other)),
        }
    }
}

/// 설정 레벨 문자열을 필터로 변환합니다.
fn build_filter(level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    let directive = if level.trim().is_empty() {
        FALLBACK_DIRECTIVE
    } else {
        level
    };
    EnvFilter::try_new(directive)
}

/// 전역 subscriber를 설치합니다. 두 번째 호출은 에러를 반환합니다.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let format: LogFormat = config.format.parse()?;
    let filter = build_filter(&config.level)?;

    // 선택되지 않은 레이어는 None으로 비활성화
    let pretty = (format == LogFormat::Pretty).then(|| fmt::layer().pretty());
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });
    let compact = (format == LogFormat::Compact).then(|| fmt::layer().compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(compact)
        .try_init()?;

    tracing::info!(format = format.as_str(), level = %config.level, "Logging initialized");
    Ok(())
}
