//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증. 비용 파라미터는 설정에서 주입됩니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use attendance_core::{Argon2Config, SchoolError, SchoolResult};

/// 사용자가 없을 때 비교 대상으로 쓰는 평문.
const DUMMY_PASSWORD: &str = "attendance-dummy-credential-0";

/// Argon2id 해셔.
///
/// 생성 시 더미 해시를 한 번 계산해 두고, 사용자가 없는 로그인도 같은
/// 비용으로 검증합니다.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// 설정의 비용 파라미터로 해셔를 생성합니다.
    ///
    /// # Errors
    ///
    /// 파라미터가 Argon2 허용 범위를 벗어나면 `SchoolError::Configuration`.
    pub fn new(config: &Argon2Config) -> SchoolResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| SchoolError::Configuration(format!("잘못된 argon2 파라미터: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(hasher)
    }

    /// 비밀번호 해싱.
    ///
    /// 솔트는 자동으로 생성되며 PHC 형식 문자열을 반환합니다.
    ///
    /// ```rust,ignore
    /// let hash = hasher.hash("my_secure_password1")?;
    /// // "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// ```
    pub fn hash(&self, password: &str) -> SchoolResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SchoolError::Internal(format!("비밀번호 해싱 실패: {}", e)))?;
        Ok(hash.to_string())
    }

    /// 비밀번호 검증. 형식이 잘못된 해시는 불일치로 취급합니다.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// 저장된 해시가 없으면 더미 해시로 검증하고 항상 `false`를 반환합니다.
    pub fn verify_or_dummy(&self, password: &str, hash: Option<&str>) -> bool {
        match hash {
            Some(hash) => self.verify(password, hash),
            None => {
                let _ = self.verify(password, &self.dummy_hash);
                false
            }
        }
    }
}

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("비밀번호는 최소 8자 이상이어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("비밀번호에 최소 1개의 숫자가 포함되어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("비밀번호에 최소 1개의 영문자가 포함되어야 합니다");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::new(&Argon2Config {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correctpw1").unwrap();

        // 해시 형식 확인 (argon2id)
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correctpw1", &hash));
        assert!(!hasher.verify("wrongpw1", &hash));
    }

    #[test]
    fn test_same_password_different_salt() {
        let hasher = fast_hasher();
        let a = hasher.hash("correctpw1").unwrap();
        let b = hasher.hash("correctpw1").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("correctpw1", &a));
        assert!(hasher.verify("correctpw1", &b));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify_or_dummy(DUMMY_PASSWORD, None));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let err = CredentialHasher::new(&Argon2Config {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, SchoolError::Configuration(_)));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("abc123").is_err()); // 너무 짧음
        assert!(validate_password_strength("abcdefgh").is_err()); // 숫자 없음
        assert!(validate_password_strength("12345678").is_err()); // 영문자 없음
        assert!(validate_password_strength("passw0rd").is_ok());
    }
}
