//! 출석 기록 repository.
//!
//! 하루 한 번 제약은 `uq_attendance_student_day` 부분 고유 인덱스가 보장합니다.
//! 동시에 들어온 삽입 중 하나만 성공하고 나머지는 `23505`로 실패합니다.

use async_trait::async_trait;
use attendance_core::{
    AttendancePatch, AttendanceRecord, AttendanceStore, NewAttendance, SchoolError, SchoolResult,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Database;
use crate::error::DataError;

/// 출석 기록 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub id: Uuid,
    pub student_nis: String,
    pub class_id: Option<Uuid>,
    pub attendance_date: NaiveDate,
    pub status: String,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = DataError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e: SchoolError| DataError::InvalidData(e.to_string()))?;

        Ok(AttendanceRecord {
            id: row.id,
            student_id: row.student_nis,
            class_id: row.class_id,
            date: row.attendance_date,
            status,
            time_in: row.time_in,
            time_out: row.time_out,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
        })
    }
}

fn into_record(row: Option<AttendanceRow>) -> SchoolResult<Option<AttendanceRecord>> {
    Ok(row.map(AttendanceRecord::try_from).transpose()?)
}

#[derive(Clone)]
pub struct PgAttendanceStore {
    db: Database,
}

impl PgAttendanceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    #[instrument(skip(self, new), fields(student = %new.student_id, date = %new.date))]
    async fn insert(&self, new: NewAttendance) -> SchoolResult<AttendanceRecord> {
        let row: AttendanceRow = sqlx::query_as(
            r#"
            INSERT INTO attendance_records (
                id, student_nis, class_id, attendance_date, status,
                time_in, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.student_id)
        .bind(new.class_id)
        .bind(new.date)
        .bind(new.status.as_str())
        .bind(new.time_in)
        .bind(&new.created_by)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| match DataError::from(e) {
            DataError::DuplicateError(_) => SchoolError::AlreadyMarked,
            other => other.into(),
        })?;

        debug!(record_id = %row.id, "Attendance inserted");
        Ok(row.try_into()?)
    }

    async fn get(&self, id: Uuid) -> SchoolResult<Option<AttendanceRecord>> {
        let row: Option<AttendanceRow> = sqlx::query_as(
            "SELECT * FROM attendance_records WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DataError::from)?;

        into_record(row)
    }

    async fn find_for_day(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> SchoolResult<Option<AttendanceRecord>> {
        let row: Option<AttendanceRow> = sqlx::query_as(
            r#"
            SELECT * FROM attendance_records
            WHERE student_nis = $1 AND attendance_date = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DataError::from)?;

        into_record(row)
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: Uuid,
        patch: &AttendancePatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<Option<AttendanceRecord>> {
        let row: Option<AttendanceRow> = sqlx::query_as(
            r#"
            UPDATE attendance_records SET
                status = COALESCE($2, status),
                time_in = COALESCE($3, time_in),
                time_out = COALESCE($4, time_out),
                updated_by = $5,
                updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.time_in)
        .bind(patch.time_out)
        .bind(actor)
        .bind(at)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DataError::from)?;

        into_record(row)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: Uuid, actor: &str, at: DateTime<Utc>) -> SchoolResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_records SET deleted_at = $2, deleted_by = $3
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
}
