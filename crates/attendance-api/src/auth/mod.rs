//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`TokenIssuer`]: HS256 세션 토큰 발급/검증
//! - [`CredentialHasher`]: Argon2id 비밀번호 해싱
//! - [`AuthSession`]: 세션 캐시와 대조하는 Axum 추출기
//! - 역할별 추출기 [`AdminAuth`], [`TeacherAuth`], [`StudentAuth`]

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, IssuedToken, TokenIssuer};
pub use middleware::{
    clear_session_cookie, extract_token, parse_cookie, require_role, session_cookie, AdminAuth,
    AuthSession, StudentAuth, TeacherAuth,
};
pub use password::{validate_password_strength, CredentialHasher};
