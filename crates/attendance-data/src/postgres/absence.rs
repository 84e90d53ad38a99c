//! 결석 신청 repository.
//!
//! 수정과 결정은 모두 `WHERE status = 'pending'` 조건부 UPDATE라서
//! 이미 종료된 신청은 동시 요청이 있어도 다시 바뀌지 않습니다.

use async_trait::async_trait;
use attendance_core::{
    AbsenceRequest, AbsenceRequestEdit, AbsenceRequestStore, Decision, NewAbsenceRequest, Page,
    PageRequest, RequestStatus, SchoolError, SchoolResult,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{as_total, limit_offset, Database};
use crate::error::DataError;

/// 결석 신청 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct AbsenceRequestRecord {
    pub id: Uuid,
    pub student_nis: String,
    pub class_id: Option<Uuid>,
    pub request_date: NaiveDate,
    pub reason: String,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl TryFrom<AbsenceRequestRecord> for AbsenceRequest {
    type Error = DataError;

    fn try_from(row: AbsenceRequestRecord) -> Result<Self, Self::Error> {
        let status: RequestStatus = row
            .status
            .parse()
            .map_err(|e: SchoolError| DataError::InvalidData(e.to_string()))?;

        Ok(AbsenceRequest {
            id: row.id,
            student_id: row.student_nis,
            class_id: row.class_id,
            request_date: row.request_date,
            reason: row.reason,
            status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejected_by: row.rejected_by,
            rejected_at: row.rejected_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
        })
    }
}

fn into_request(row: Option<AbsenceRequestRecord>) -> SchoolResult<Option<AbsenceRequest>> {
    Ok(row.map(AbsenceRequest::try_from).transpose()?)
}

fn into_page(rows: Vec<AbsenceRequestRecord>, total: i64) -> SchoolResult<Page<AbsenceRequest>> {
    let items = rows
        .into_iter()
        .map(AbsenceRequest::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, as_total(total)))
}

#[derive(Clone)]
pub struct PgAbsenceRequestStore {
    db: Database,
}

impl PgAbsenceRequestStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 조건(`filter`)에 맞는 신청 한 페이지와 전체 개수.
    ///
    /// `filter`는 텍스트 인자 `$1` 하나만 바인딩하는 고정 SQL 조각이어야 합니다.
    async fn page_where(
        &self,
        filter: &str,
        arg: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        let (limit, offset) = limit_offset(page);

        let count_sql = format!(
            "SELECT COUNT(*) FROM absence_requests WHERE deleted_at IS NULL AND {filter}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(arg)
            .fetch_one(self.db.pool())
            .await
            .map_err(DataError::from)?;

        let list_sql = format!(
            "SELECT * FROM absence_requests WHERE deleted_at IS NULL AND {filter} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows: Vec<AbsenceRequestRecord> = sqlx::query_as(&list_sql)
            .bind(arg)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await
            .map_err(DataError::from)?;

        into_page(rows, total)
    }
}

#[async_trait]
impl AbsenceRequestStore for PgAbsenceRequestStore {
    #[instrument(skip(self, new), fields(student = %new.student_id))]
    async fn insert(
        &self,
        new: NewAbsenceRequest,
        at: DateTime<Utc>,
    ) -> SchoolResult<AbsenceRequest> {
        let row: AbsenceRequestRecord = sqlx::query_as(
            r#"
            INSERT INTO absence_requests (
                id, student_nis, class_id, request_date, reason, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.student_id)
        .bind(new.class_id)
        .bind(new.request_date)
        .bind(&new.reason)
        .bind(at)
        .fetch_one(self.db.pool())
        .await
        .map_err(DataError::from)?;

        debug!(request_id = %row.id, "Absence request inserted");
        Ok(row.try_into()?)
    }

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AbsenceRequest>> {
        let row: Option<AbsenceRequestRecord> = sqlx::query_as(
            "SELECT * FROM absence_requests WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DataError::from)?;

        into_request(row)
    }

    #[instrument(skip(self, edit))]
    async fn update_pending(
        &self,
        id: Uuid,
        edit: &AbsenceRequestEdit,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>> {
        let row: Option<AbsenceRequestRecord> = sqlx::query_as(
            r#"
            UPDATE absence_requests SET
                request_date = COALESCE($2, request_date),
                reason = COALESCE($3, reason),
                updated_at = $4
            WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(edit.request_date)
        .bind(edit.reason.as_deref())
        .bind(at)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DataError::from)?;

        into_request(row)
    }

    #[instrument(skip(self))]
    async fn apply_decision(
        &self,
        id: Uuid,
        decision: Decision,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AbsenceRequest>> {
        let sql = match decision {
            Decision::Approve => {
                r#"
                UPDATE absence_requests SET
                    status = 'approved', approved_by = $2, approved_at = $3, updated_at = $3
                WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL
                RETURNING *
                "#
            }
            Decision::Reject => {
                r#"
                UPDATE absence_requests SET
                    status = 'rejected', rejected_by = $2, rejected_at = $3, updated_at = $3
                WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL
                RETURNING *
                "#
            }
        };

        let row: Option<AbsenceRequestRecord> = sqlx::query_as(sql)
            .bind(id)
            .bind(actor)
            .bind(at)
            .fetch_optional(self.db.pool())
            .await
            .map_err(DataError::from)?;

        into_request(row)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE absence_requests SET deleted_at = $2, deleted_by = $3
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(actor)
        .execute(self.db.pool())
        .await
        .map_err(DataError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_pending(&self, page: PageRequest) -> SchoolResult<Page<AbsenceRequest>> {
        self.page_where("status = $1", RequestStatus::Pending.as_str(), page)
            .await
    }

    async fn list_by_student(
        &self,
        student_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        self.page_where("student_nis = $1", student_id, page)
            .await
    }

    async fn list_by_class(
        &self,
        class_id: Uuid,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        self.page_where("class_id = $1::uuid", &class_id.to_string(), page)
            .await
    }

    async fn list_by_teacher(
        &self,
        teacher_id: &str,
        page: PageRequest,
    ) -> SchoolResult<Page<AbsenceRequest>> {
        self.page_where(
            "class_id IN (SELECT id FROM classes WHERE homeroom_teacher_nip = $1)",
            teacher_id,
            page,
        )
        .await
    }
}
