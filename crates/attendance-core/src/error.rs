//! 출결 시스템의 에러 타입.
//!
//! 인증, 출석 기록, 결석 신청 워크플로우 전반에서 사용되는 에러를 정의합니다.
//! HTTP 상태 코드로의 매핑은 전송 계층(`attendance-api`)이 담당합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchoolError {
    /// 존재하지 않는 사용자이거나 비밀번호 불일치
    #[error("아이디 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 비활성화된 계정
    #[error("비활성화된 계정입니다")]
    AccountDeactivated,

    /// 세션 토큰이 없거나 유효하지 않음
    #[error("인증이 필요합니다: {0}")]
    Unauthenticated(String),

    /// 소유자가 아니거나 권한 부족
    #[error("권한이 없습니다: {0}")]
    Unauthorized(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 대기 상태가 아닌 결석 신청
    #[error("대기 중인 신청이 아닙니다")]
    NotPending,

    /// 같은 날 이미 출석 처리됨
    #[error("오늘은 이미 출석 처리되었습니다")]
    AlreadyMarked,

    /// 날짜 형식 오류
    #[error("잘못된 날짜 형식: {0}")]
    InvalidDate(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    Validation(String),

    /// 설정 에러 (서명 키 누락 등)
    #[error("설정 에러: {0}")]
    Configuration(String),

    /// 저장소 에러 (DB, 세션 캐시)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 출결 작업을 위한 Result 타입.
pub type SchoolResult<T> = Result<T, SchoolError>;

impl SchoolError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 저장소 장애만 재시도 대상입니다. `AlreadyMarked` 같은 비즈니스 에러는
    /// 같은 요청을 다시 보내도 결과가 바뀌지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchoolError::Storage(_))
    }

    /// 클라이언트가 입력을 고쳐서 해결할 수 있는 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            SchoolError::Configuration(_) | SchoolError::Storage(_) | SchoolError::Internal(_)
        )
    }

    /// 응답 본문에 사용할 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            SchoolError::InvalidCredentials => "INVALID_CREDENTIALS",
            SchoolError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            SchoolError::Unauthenticated(_) => "UNAUTHENTICATED",
            SchoolError::Unauthorized(_) => "UNAUTHORIZED",
            SchoolError::NotFound(_) => "NOT_FOUND",
            SchoolError::NotPending => "NOT_PENDING",
            SchoolError::AlreadyMarked => "ALREADY_MARKED",
            SchoolError::InvalidDate(_) => "INVALID_DATE",
            SchoolError::Validation(_) => "VALIDATION_ERROR",
            SchoolError::Configuration(_) => "CONFIGURATION_ERROR",
            SchoolError::Storage(_) => "STORAGE_ERROR",
            SchoolError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for SchoolError {
    fn from(err: config::ConfigError) -> Self {
        SchoolError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(SchoolError::Storage("connection reset".to_string()).is_retryable());
        assert!(!SchoolError::AlreadyMarked.is_retryable());
        assert!(!SchoolError::InvalidCredentials.is_retryable());
    }

    #[test]
    fn test_client_errors() {
        assert!(SchoolError::NotPending.is_client_error());
        assert!(SchoolError::InvalidDate("2024-13-01".to_string()).is_client_error());
        assert!(!SchoolError::Configuration("missing key".to_string()).is_client_error());
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            SchoolError::InvalidCredentials,
            SchoolError::AccountDeactivated,
            SchoolError::Unauthenticated(String::new()),
            SchoolError::Unauthorized(String::new()),
            SchoolError::NotFound(String::new()),
            SchoolError::NotPending,
            SchoolError::AlreadyMarked,
            SchoolError::InvalidDate(String::new()),
            SchoolError::Validation(String::new()),
            SchoolError::Configuration(String::new()),
            SchoolError::Storage(String::new()),
            SchoolError::Internal(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
