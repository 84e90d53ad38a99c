//! JWT 세션 토큰 처리.
//!
//! 토큰 생성/검증 로직. 만료 판단은 주입된 시계 기준으로 수행합니다.

use attendance_core::{AuthConfig, Role, SchoolError, SchoolResult, MIN_JWT_SECRET_LEN};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 식별 키 (이메일/NIP/NIS)
    pub sub: String,
    /// 사용자 역할
    pub role: Role,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
}

impl Claims {
    /// 주어진 시각 기준 만료 여부.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 발급된 토큰.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// HS256 토큰 발급기.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// 서명 키와 세션 TTL로 발급기를 생성합니다.
    ///
    /// # Errors
    ///
    /// 서명 키가 `MIN_JWT_SECRET_LEN` 바이트보다 짧으면 `SchoolError::Configuration`.
    pub fn new(secret: SecretString, ttl_secs: u64) -> SchoolResult<Self> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.len() < MIN_JWT_SECRET_LEN {
            return Err(SchoolError::Configuration(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }
        let ttl_secs = i64::try_from(ttl_secs).map_err(|_| {
            SchoolError::Configuration("auth.session_ttl_secs is too large".to_string())
        })?;

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// 설정에서 발급기를 생성합니다. 서명 키가 없으면 `SchoolError::Configuration`.
    pub fn from_config(config: &AuthConfig) -> SchoolResult<Self> {
        let secret = config
            .jwt_secret
            .clone()
            .ok_or_else(|| SchoolError::Configuration("auth.jwt_secret is not set".to_string()))?;
        Self::new(secret, config.session_ttl_secs)
    }

    /// 토큰 생성.
    pub fn issue(&self, role: Role, identity_key: &str, now: DateTime<Utc>) -> SchoolResult<IssuedToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: identity_key.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SchoolError::Internal(format!("토큰 인코딩 실패: {}", e)))?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at,
        })
    }

    /// 토큰 서명 검증 후 `now` 기준 만료를 확인합니다.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> SchoolResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 주입된 시계로 직접 판단
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            SchoolError::Unauthenticated("invalid token".to_string())
        })?;

        if data.claims.is_expired_at(now) {
            return Err(SchoolError::Unauthenticated("token expired".to_string()));
        }
        Ok(data.claims)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SecretString::new(TEST_SECRET.into()), 3600).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer.issue(Role::Student, "S1", now).unwrap();

        assert_eq!(issued.expires_at - issued.issued_at, Duration::hours(1));

        let claims = issuer.verify(&issued.token, now).unwrap();
        assert_eq!(claims.sub, "S1");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer.issue(Role::Teacher, "T1", now).unwrap();

        let err = issuer.verify(&issued.token, now + Duration::hours(2)).unwrap_err();
        assert_eq!(err, SchoolError::Unauthenticated("token expired".to_string()));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issuer().issue(Role::Admin, "ops@school.id", Utc::now()).unwrap();
        let other = TokenIssuer::new(
            SecretString::new("another-secret-key-that-is-long-enough".into()),
            3600,
        )
        .unwrap();

        assert!(matches!(
            other.verify(&issued.token, Utc::now()),
            Err(SchoolError::Unauthenticated(_))
        ));
        assert!(other.verify("not-a-jwt", Utc::now()).is_err());
    }

    #[test]
    fn test_short_or_missing_secret_is_configuration_error() {
        assert!(matches!(
            TokenIssuer::new(SecretString::new("short".into()), 3600),
            Err(SchoolError::Configuration(_))
        ));

        let config = AuthConfig::default();
        assert!(matches!(
            TokenIssuer::from_config(&config),
            Err(SchoolError::Configuration(_))
        ));
    }
}
