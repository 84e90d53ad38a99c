//! 출결 데이터 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - PostgreSQL 저장소 (자격증명, 학급 배정, 출석 기록, 결석 신청)
//! - Redis 세션 캐시
//! - 테스트용 메모리 저장소 (`test-utils` feature)

pub mod error;
pub mod postgres;
pub mod session_cache;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::{DataError, Result};
pub use postgres::{
    Database, PgAbsenceRequestStore, PgAttendanceStore, PgCredentialStore, PgStudentDirectory,
};
pub use session_cache::RedisSessionStore;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryStore;
