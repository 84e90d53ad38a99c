//! Redis 세션 캐시.
//!
//! `(role, identity_key)`마다 현재 유효한 세션 하나를 TTL과 함께 보관합니다.

use async_trait::async_trait;
use attendance_core::{Role, SchoolResult, Session, SessionStore};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::{debug, info, instrument};

use crate::error::{DataError, Result};

/// Redis 세션 저장소.
///
/// 멀티플렉스 연결은 복제해도 같은 소켓을 공유하므로 호출마다 복제해 씁니다.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSessionStore {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| DataError::ConnectionError(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    /// Redis 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    /// 세션 키.
    fn session_key(&self, role: Role, identity_key: &str) -> String {
        session_key(&self.key_prefix, role, identity_key)
    }
}

pub(crate) fn session_key(prefix: &str, role: Role, identity_key: &str) -> String {
    format!("{}:{}:{}", prefix, role, identity_key)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, session), fields(role = %session.role, identity = %session.identity_key))]
    async fn put(&self, session: &Session, ttl_secs: u64) -> SchoolResult<()> {
        let key = self.session_key(session.role, &session.identity_key);
        let json = serde_json::to_string(session).map_err(DataError::from)?;

        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(&key, json, ttl_secs.max(1))
            .await
            .map_err(DataError::from)?;

        debug!(ttl_secs, "Session stored");
        Ok(())
    }

    async fn get(&self, role: Role, identity_key: &str) -> SchoolResult<Option<Session>> {
        let key = self.session_key(role, identity_key);
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(&key).await.map_err(DataError::from)?;

        match value {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(DataError::from)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, role: Role, identity_key: &str) -> SchoolResult<()> {
        let key = self.session_key(role, identity_key);
        let mut conn = self.connection.clone();
        let deleted: i64 = conn.del(&key).await.map_err(DataError::from)?;

        debug!(deleted, "Session removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_format() {
        assert_eq!(session_key("session", Role::Student, "S1"), "session:student:S1");
        assert_eq!(
            session_key("school-a", Role::Admin, "ops@school.id"),
            "school-a:admin:ops@school.id"
        );
    }
}
