//! 학생 학급 배정과 담임 조회.

use async_trait::async_trait;
use attendance_core::{SchoolResult, StudentDirectory};
use uuid::Uuid;

use super::Database;
use crate::error::DataError;

#[derive(Clone)]
pub struct PgStudentDirectory {
    db: Database,
}

impl PgStudentDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StudentDirectory for PgStudentDirectory {
    async fn current_class(&self, student_id: &str) -> SchoolResult<Option<Uuid>> {
        let class_id: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT class_id FROM students WHERE nis = $1")
                .bind(student_id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DataError::from)?;

        Ok(class_id.flatten())
    }

    async fn is_homeroom_teacher(&self, teacher_id: &str, class_id: Uuid) -> SchoolResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM classes WHERE id = $1 AND homeroom_teacher_nip = $2)",
        )
        .bind(class_id)
        .bind(teacher_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(DataError::from)?;

        Ok(exists)
    }
}
