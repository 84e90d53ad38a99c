//! 저장소 어댑터 에러.

use attendance_core::SchoolError;
use thiserror::Error;

/// Postgres/Redis 어댑터 에러.
///
/// 호출 측으로는 `SchoolError`로 변환되어 나갑니다. 고유 제약 위반처럼
/// 업무 의미가 있는 경우는 각 저장소가 직접 변환합니다.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("연결 실패: {0}")]
    ConnectionError(String),

    #[error("쿼리 실패: {0}")]
    QueryError(String),

    #[error("레코드 없음: {0}")]
    NotFound(String),

    /// 고유 제약 위반. 값은 제약 이름 (알 수 없으면 메시지)
    #[error("고유 제약 위반: {0}")]
    DuplicateError(String),

    #[error("세션 직렬화 실패: {0}")]
    SerializationError(String),

    #[error("세션 캐시 에러: {0}")]
    CacheError(String),

    /// 저장된 값이 도메인 타입으로 변환되지 않음 (예: 알 수 없는 상태 문자열)
    #[error("잘못된 저장 데이터: {0}")]
    InvalidData(String),

    #[error("마이그레이션 실패: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DataError::ConnectionError(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                DataError::DuplicateError(constraint)
            }
            other => DataError::QueryError(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            DataError::ConnectionError(err.to_string())
        } else {
            DataError::CacheError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<DataError> for SchoolError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(what) => SchoolError::NotFound(what),
            other => SchoolError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_faults_stay_retryable() {
        let school: SchoolError = DataError::CacheError("READONLY".to_string()).into();
        assert!(matches!(school, SchoolError::Storage(_)));
        assert!(school.is_retryable());
    }

    #[test]
    fn test_not_found_passes_through() {
        let err: SchoolError = DataError::NotFound("student".to_string()).into();
        assert_eq!(err, SchoolError::NotFound("student".to_string()));
    }

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(
            DataError::from(sqlx::Error::RowNotFound),
            DataError::NotFound(_)
        ));
        assert!(matches!(
            DataError::from(sqlx::Error::PoolTimedOut),
            DataError::ConnectionError(_)
        ));
    }
}
