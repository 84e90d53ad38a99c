//! PostgreSQL 저장소 구현.
//!
//! - [`PgCredentialStore`] - 역할별 자격증명 테이블
//! - [`PgStudentDirectory`] - 학생 학급 배정, 담임 조회
//! - [`PgAttendanceStore`] - 출석 기록
//! - [`PgAbsenceRequestStore`] - 결석 신청

mod absence;
mod attendance;
mod credentials;
mod directory;

pub use absence::{AbsenceRequestRecord, PgAbsenceRequestStore};
pub use attendance::{AttendanceRow, PgAttendanceStore};
pub use credentials::{PgCredentialStore, PrincipalRecord};
pub use directory::PgStudentDirectory;

use std::time::Duration;

use attendance_core::{DatabaseConfig, PageRequest};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::{DataError, Result};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| DataError::ConnectionError("database.url is not set".to_string()))?;

        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

/// LIMIT/OFFSET 바인딩 값.
pub(crate) fn limit_offset(page: PageRequest) -> (i64, i64) {
    (
        i64::from(page.limit),
        i64::try_from(page.offset).unwrap_or(i64::MAX),
    )
}

/// COUNT(*) 결과 변환.
pub(crate) fn as_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset_saturates() {
        let page = PageRequest {
            limit: 100,
            offset: u64::MAX,
        };
        assert_eq!(limit_offset(page), (100, i64::MAX));
    }
}
