//! 로그인, 세션 확인, 자격증명 관리.
//!
//! 세 역할의 인증 경로는 `CredentialProvider` 하나로 통합되어 있으며
//! 역할은 `Role` 값으로만 구분됩니다.

use std::sync::Arc;

use attendance_core::{
    Clock, CredentialProvider, Identity, Principal, Role, SchoolError, SchoolResult, Session,
    SessionStore,
};
use tracing::{debug, info, instrument, warn};

use crate::auth::{validate_password_strength, CredentialHasher, TokenIssuer};
use crate::metrics::record_login;

/// 인증 서비스.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialProvider>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenIssuer>,
    hasher: Arc<CredentialHasher>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenIssuer>,
        hasher: Arc<CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            tokens,
            hasher,
            clock,
        }
    }

    /// 자격증명을 확인하고 사용자를 반환합니다.
    ///
    /// 해시 검증을 항상 먼저 수행하고(사용자가 없으면 더미 해시로),
    /// 비밀번호가 맞는 경우에만 활성 여부를 확인합니다.
    ///
    /// # Errors
    ///
    /// - `SchoolError::InvalidCredentials`: 사용자가 없거나 비밀번호 불일치
    /// - `SchoolError::AccountDeactivated`: 비밀번호는 맞지만 비활성 계정
    pub async fn verify_principal(
        &self,
        role: Role,
        identity_key: &str,
        password: &str,
    ) -> SchoolResult<Principal> {
        let principal = self.credentials.find_principal(role, identity_key).await?;

        let hasher = Arc::clone(&self.hasher);
        let candidate = password.to_string();
        let stored = principal.as_ref().map(|p| p.credential_hash.clone());
        let matched = tokio::task::spawn_blocking(move || {
            hasher.verify_or_dummy(&candidate, stored.as_deref())
        })
        .await
        .map_err(|e| SchoolError::Internal(format!("비밀번호 검증 작업 실패: {}", e)))?;

        match principal {
            Some(principal) if matched => {
                if principal.active {
                    Ok(principal)
                } else {
                    Err(SchoolError::AccountDeactivated)
                }
            }
            _ => Err(SchoolError::InvalidCredentials),
        }
    }

    /// 로그인.
    ///
    /// 성공하면 새 토큰을 발급해 세션 캐시의 `(role, identity_key)` 항목을
    /// 덮어씁니다. 관리자 로그인은 마지막 로그인 시각을 기록합니다.
    #[instrument(skip(self, password), fields(role = %role))]
    pub async fn login(
        &self,
        role: Role,
        identity_key: &str,
        password: &str,
    ) -> SchoolResult<Session> {
        let result = self.login_inner(role, identity_key, password).await;

        match &result {
            Ok(_) => {
                record_login(role.as_str(), "success");
                info!(identity = %identity_key, "Login succeeded");
            }
            Err(SchoolError::InvalidCredentials) => {
                record_login(role.as_str(), "invalid_credentials");
                warn!(identity = %identity_key, "Login rejected: invalid credentials");
            }
            Err(SchoolError::AccountDeactivated) => {
                record_login(role.as_str(), "deactivated");
                warn!(identity = %identity_key, "Login rejected: account deactivated");
            }
            Err(e) => {
                record_login(role.as_str(), "error");
                warn!(identity = %identity_key, error = %e, "Login failed");
            }
        }

        result
    }

    async fn login_inner(
        &self,
        role: Role,
        identity_key: &str,
        password: &str,
    ) -> SchoolResult<Session> {
        let principal = self.verify_principal(role, identity_key, password).await?;

        let now = self.clock.now();
        let issued = self.tokens.issue(role, &principal.identity_key, now)?;
        let session = Session {
            role,
            identity_key: principal.identity_key.clone(),
            token: issued.token,
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
        };
        self.sessions
            .put(&session, self.tokens.ttl_secs())
            .await?;

        if role == Role::Admin {
            if let Err(e) = self
                .credentials
                .record_login(role, &principal.identity_key, now)
                .await
            {
                warn!(identity = %principal.identity_key, error = %e, "Failed to record last login");
            }
        }

        Ok(session)
    }

    /// 로그아웃. 세션이 없어도 성공합니다.
    #[instrument(skip(self))]
    pub async fn logout(&self, role: Role, identity_key: &str) -> SchoolResult<()> {
        self.sessions.delete(role, identity_key).await?;
        debug!("Session deleted");
        Ok(())
    }

    /// 토큰에서 호출자 신원을 복원합니다.
    ///
    /// 서명과 만료를 확인한 뒤, 세션 캐시에 같은 토큰이 저장되어 있어야
    /// 유효합니다. 로그아웃이나 재로그인 이후의 이전 토큰은 거부됩니다.
    pub async fn resolve(&self, token: &str) -> SchoolResult<Identity> {
        let now = self.clock.now();
        let claims = self.tokens.verify(token, now)?;

        let session = self
            .sessions
            .get(claims.role, &claims.sub)
            .await?
            .ok_or_else(|| SchoolError::Unauthenticated("session not found".to_string()))?;

        if session.token != token || session.is_expired_at(now) {
            return Err(SchoolError::Unauthenticated(
                "session revoked or expired".to_string(),
            ));
        }

        Ok(session.identity())
    }

    /// 본인 비밀번호 변경. 성공하면 현재 세션이 삭제됩니다.
    #[instrument(skip(self, current, new_password))]
    pub async fn change_password(
        &self,
        role: Role,
        identity_key: &str,
        current: &str,
        new_password: &str,
    ) -> SchoolResult<()> {
        self.verify_principal(role, identity_key, current).await?;
        self.store_new_password(role, identity_key, new_password)
            .await?;
        info!("Password changed");
        Ok(())
    }

    /// 관리자 비밀번호 초기화.
    ///
    /// # Errors
    ///
    /// - `SchoolError::Validation`: 비밀번호 강도 미달
    /// - `SchoolError::NotFound`: 사용자가 없음
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        role: Role,
        identity_key: &str,
        new_password: &str,
    ) -> SchoolResult<()> {
        self.store_new_password(role, identity_key, new_password)
            .await?;
        info!("Password reset by admin");
        Ok(())
    }

    /// 계정 활성화/비활성화. 비활성화하면 세션도 삭제됩니다.
    #[instrument(skip(self))]
    pub async fn set_active(&self, role: Role, identity_key: &str, active: bool) -> SchoolResult<()> {
        self.credentials
            .set_active(role, identity_key, active)
            .await?;
        if !active {
            self.sessions.delete(role, identity_key).await?;
        }
        info!(active, "Account active flag changed");
        Ok(())
    }

    async fn store_new_password(
        &self,
        role: Role,
        identity_key: &str,
        new_password: &str,
    ) -> SchoolResult<()> {
        validate_password_strength(new_password)
            .map_err(|msg| SchoolError::Validation(msg.to_string()))?;

        let hasher = Arc::clone(&self.hasher);
        let plain = new_password.to_string();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| SchoolError::Internal(format!("비밀번호 해싱 작업 실패: {}", e)))??;

        self.credentials
            .update_credential_hash(role, identity_key, &hash)
            .await?;
        self.sessions.delete(role, identity_key).await
    }
}
