//! # Attendance Core
//!
//! 학교 출결 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 출결 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 역할/권한과 인증 주체, 세션
//! - 출석 기록과 결석 신청 상태 기계
//! - 저장소 추상화 (`ports`)
//! - 설정 관리
//! - 로깅 인프라

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod ports;

pub use clock::*;
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use ports::*;
