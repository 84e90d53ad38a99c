//! 인증 주체(Principal)와 세션.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// 역할별 자격증명 테이블의 한 행.
///
/// `identity_key`는 관리자는 이메일, 교사는 NIP, 학생은 NIS입니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub identity_key: String,
    pub display_name: String,
    pub credential_hash: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("identity_key", &self.identity_key)
            .field("display_name", &self.display_name)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// 토큰에서 복원된 호출자 신원.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    pub identity_key: String,
}

impl Identity {
    pub fn new(role: Role, identity_key: impl Into<String>) -> Self {
        Self {
            role,
            identity_key: identity_key.into(),
        }
    }

    /// 지정한 역할의 특정 사용자인지 확인.
    pub fn is(&self, role: Role, identity_key: &str) -> bool {
        self.role == role && self.identity_key == identity_key
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.identity_key)
    }
}

/// 세션 캐시에 저장되는 현재 유효 세션.
///
/// `(role, identity_key)`마다 하나만 존재하며 로그인 시 무조건 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    pub identity_key: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn identity(&self) -> Identity {
        Identity::new(self.role, self.identity_key.clone())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// 남은 TTL (초). 만료되었으면 0.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}
