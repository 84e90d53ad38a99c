//! 출석 기록 타입.
//!
//! - `AttendanceStatus` - 출석 상태
//! - `AttendanceRecord` - 학생별 일자별 출석 기록
//! - `NewAttendance` - 저장소에 삽입할 새 기록
//! - `AttendancePatch` - 관리자 정정 요청

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SchoolError, SchoolResult};

/// 출석 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// 출석
    Present,
    /// 결석
    Absent,
    /// 지각
    Late,
    /// 인정 결석
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            other => Err(SchoolError::Validation(format!(
                "알 수 없는 출석 상태: {}",
                other
            ))),
        }
    }
}

/// 출석 기록.
///
/// 삭제되지 않은 기록은 `(student_id, date)`마다 최대 하나입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: String,
    /// 출석 시점의 학급 (배정되지 않았으면 null)
    pub class_id: Option<Uuid>,
    /// 학교 시간대 기준 날짜
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl AttendanceRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// 새 출석 기록 입력.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: String,
    pub class_id: Option<Uuid>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub time_in: DateTime<Utc>,
    pub created_by: String,
}

/// 관리자 정정 입력. `None` 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AttendancePatch {
    pub status: Option<AttendanceStatus>,
    pub time_in: Option<DateTime<Utc>>,
    pub time_out: Option<DateTime<Utc>>,
}

impl AttendancePatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.time_in.is_none() && self.time_out.is_none()
    }

    /// 기존 기록에 적용했을 때의 결과가 유효한지 검사합니다.
    pub fn validate_against(&self, current: &AttendanceRecord) -> SchoolResult<()> {
        if self.is_empty() {
            return Err(SchoolError::Validation("변경할 항목이 없습니다".to_string()));
        }
        let time_in = self.time_in.unwrap_or(current.time_in);
        if let Some(time_out) = self.time_out.or(current.time_out) {
            if time_out < time_in {
                return Err(SchoolError::Validation(
                    "time_out은 time_in보다 빠를 수 없습니다".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// 패치를 기록에 적용합니다 (메모리 저장소와 테스트에서 사용).
    pub fn apply_to(&self, record: &mut AttendanceRecord, actor: &str, at: DateTime<Utc>) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(time_in) = self.time_in {
            record.time_in = time_in;
        }
        if let Some(time_out) = self.time_out {
            record.time_out = Some(time_out);
        }
        record.updated_by = Some(actor.to_string());
        record.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record() -> AttendanceRecord {
        let time_in = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: "S2".to_string(),
            class_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: AttendanceStatus::Present,
            time_in,
            time_out: None,
            created_by: "S2".to_string(),
            updated_by: None,
            created_at: time_in,
            updated_at: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::Excused,
        ] {
            assert_eq!(status.as_str().parse::<AttendanceStatus>().unwrap(), status);
        }
        assert!("sick".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_empty_patch_rejected() {
        let patch = AttendancePatch::default();
        assert!(matches!(
            patch.validate_against(&record()),
            Err(SchoolError::Validation(_))
        ));
    }

    #[test]
    fn test_time_out_before_time_in_rejected() {
        let current = record();
        let patch = AttendancePatch {
            time_out: Some(current.time_in - Duration::minutes(1)),
            ..Default::default()
        };
        assert!(patch.validate_against(&current).is_err());
    }

    #[test]
    fn test_apply_patch_stamps_actor() {
        let mut current = record();
        let at = current.time_in + Duration::hours(3);
        let patch = AttendancePatch {
            status: Some(AttendanceStatus::Late),
            time_out: Some(at),
            ..Default::default()
        };
        patch.validate_against(&current).unwrap();
        patch.apply_to(&mut current, "admin@school.id", at);

        assert_eq!(current.status, AttendanceStatus::Late);
        assert_eq!(current.time_out, Some(at));
        assert_eq!(current.updated_by.as_deref(), Some("admin@school.id"));
        assert_eq!(current.updated_at, Some(at));
    }
}
