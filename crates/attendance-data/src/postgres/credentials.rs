//! 역할별 자격증명 테이블.
//!
//! 관리자는 `admins.email`, 교사는 `teachers.nip`, 학생은 `students.nis`로
//! 식별됩니다. 세 테이블은 같은 컬럼 구성을 가지므로 하나의 저장소가
//! 역할에 따라 테이블만 바꿔서 처리합니다.

use async_trait::async_trait;
use attendance_core::{CredentialProvider, Principal, Role, SchoolError, SchoolResult};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Database;
use crate::error::DataError;

/// 자격증명 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRecord {
    pub id: Uuid,
    pub identity_key: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl PrincipalRecord {
    fn into_principal(self, role: Role) -> Principal {
        Principal {
            id: self.id,
            role,
            identity_key: self.identity_key,
            display_name: self.name,
            credential_hash: self.password_hash,
            active: self.is_active,
            last_login_at: self.last_login_at,
        }
    }
}

/// `(테이블, 식별 컬럼)`.
fn table_for(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Admin => ("admins", "email"),
        Role::Teacher => ("teachers", "nip"),
        Role::Student => ("students", "nis"),
    }
}

/// 자격증명 repository.
#[derive(Clone)]
pub struct PgCredentialStore {
    db: Database,
}

impl PgCredentialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialProvider for PgCredentialStore {
    #[instrument(skip(self))]
    async fn find_principal(
        &self,
        role: Role,
        identity_key: &str,
    ) -> SchoolResult<Option<Principal>> {
        let (table, key_column) = table_for(role);
        let sql = format!(
            "SELECT id, {key_column} AS identity_key, name, password_hash, is_active, last_login_at \
             FROM {table} WHERE {key_column} = $1"
        );

        let record: Option<PrincipalRecord> = sqlx::query_as(&sql)
            .bind(identity_key)
            .fetch_optional(self.db.pool())
            .await
            .map_err(DataError::from)?;

        Ok(record.map(|r| r.into_principal(role)))
    }

    async fn record_login(
        &self,
        role: Role,
        identity_key: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<()> {
        let (table, key_column) = table_for(role);
        let sql = format!("UPDATE {table} SET last_login_at = $2 WHERE {key_column} = $1");

        sqlx::query(&sql)
            .bind(identity_key)
            .bind(at)
            .execute(self.db.pool())
            .await
            .map_err(DataError::from)?;

        Ok(())
    }

    #[instrument(skip(self, credential_hash))]
    async fn update_credential_hash(
        &self,
        role: Role,
        identity_key: &str,
        credential_hash: &str,
    ) -> SchoolResult<()> {
        let (table, key_column) = table_for(role);
        let sql = format!(
            "UPDATE {table} SET password_hash = $2, updated_at = NOW() WHERE {key_column} = $1"
        );

        let result = sqlx::query(&sql)
            .bind(identity_key)
            .bind(credential_hash)
            .execute(self.db.pool())
            .await
            .map_err(DataError::from)?;

        if result.rows_affected() == 0 {
            return Err(SchoolError::NotFound(format!("{}:{}", role, identity_key)));
        }

        debug!("Credential hash updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, role: Role, identity_key: &str, active: bool) -> SchoolResult<()> {
        let (table, key_column) = table_for(role);
        let sql = format!(
            "UPDATE {table} SET is_active = $2, updated_at = NOW() WHERE {key_column} = $1"
        );

        let result = sqlx::query(&sql)
            .bind(identity_key)
            .bind(active)
            .execute(self.db.pool())
            .await
            .map_err(DataError::from)?;

        if result.rows_affected() == 0 {
            return Err(SchoolError::NotFound(format!("{}:{}", role, identity_key)));
        }

        Ok(())
    }
}
