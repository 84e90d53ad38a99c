//! 결석 신청 타입과 상태 기계.
//!
//! 상태 전이는 `pending → approved` 또는 `pending → rejected`만 허용되며,
//! 두 종료 상태에서는 어떤 전이도 일어나지 않습니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SchoolError, SchoolResult};

/// 결석 신청 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// 대기 (생성 시 서버가 지정)
    Pending,
    /// 승인 (종료 상태)
    Approved,
    /// 반려 (종료 상태)
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// 교사 결정을 적용한 다음 상태.
    ///
    /// 대기 상태가 아니면 `NotPending`.
    pub fn decide(self, decision: Decision) -> SchoolResult<RequestStatus> {
        match (self, decision) {
            (RequestStatus::Pending, Decision::Approve) => Ok(RequestStatus::Approved),
            (RequestStatus::Pending, Decision::Reject) => Ok(RequestStatus::Rejected),
            (RequestStatus::Approved | RequestStatus::Rejected, _) => Err(SchoolError::NotPending),
        }
    }

    /// 학생 본인 수정 가능 여부.
    pub fn ensure_editable(self) -> SchoolResult<()> {
        if self.is_terminal() {
            Err(SchoolError::NotPending)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(SchoolError::Validation(format!(
                "알 수 없는 신청 상태: {}",
                other
            ))),
        }
    }
}

/// 교사의 결정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

/// 결석 신청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AbsenceRequest {
    pub id: Uuid,
    pub student_id: String,
    /// 제출 시점의 학급 스냅샷
    pub class_id: Option<Uuid>,
    pub request_date: NaiveDate,
    pub reason: String,
    pub status: RequestStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl AbsenceRequest {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, student_id: &str) -> bool {
        self.student_id == student_id
    }

    /// 학생 수정 적용. 대기 상태가 아니면 아무것도 바꾸지 않고 `NotPending`.
    pub fn apply_edit(&mut self, edit: &AbsenceRequestEdit, at: DateTime<Utc>) -> SchoolResult<()> {
        self.status.ensure_editable()?;
        if let Some(date) = edit.request_date {
            self.request_date = date;
        }
        if let Some(reason) = &edit.reason {
            self.reason = reason.clone();
        }
        self.updated_at = Some(at);
        Ok(())
    }

    /// 교사 결정 적용. 결정에 맞는 처리자/시각을 기록합니다.
    pub fn apply_decision(
        &mut self,
        decision: Decision,
        actor: &str,
        at: DateTime<Utc>,
    ) -> SchoolResult<()> {
        let next = self.status.decide(decision)?;
        match decision {
            Decision::Approve => {
                self.approved_by = Some(actor.to_string());
                self.approved_at = Some(at);
            }
            Decision::Reject => {
                self.rejected_by = Some(actor.to_string());
                self.rejected_at = Some(at);
            }
        }
        self.status = next;
        self.updated_at = Some(at);
        Ok(())
    }
}

/// 새 결석 신청 입력. 상태는 항상 `Pending`으로 저장됩니다.
#[derive(Debug, Clone)]
pub struct NewAbsenceRequest {
    pub student_id: String,
    pub class_id: Option<Uuid>,
    pub request_date: NaiveDate,
    pub reason: String,
}

/// 학생 본인 수정 입력.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsenceRequestEdit {
    pub request_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

impl AbsenceRequestEdit {
    pub fn is_empty(&self) -> bool {
        self.request_date.is_none() && self.reason.is_none()
    }
}

/// 고정 형식 날짜 파싱.
pub fn parse_request_date(raw: &str, format: &str) -> SchoolResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format)
        .map_err(|_| SchoolError::InvalidDate(format!("'{}' (expected {})", raw, format)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> AbsenceRequest {
        AbsenceRequest {
            id: Uuid::new_v4(),
            student_id: "S1".to_string(),
            class_id: None,
            request_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: "flu".to_string(),
            status: RequestStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_decide_from_pending() {
        assert_eq!(
            RequestStatus::Pending.decide(Decision::Approve),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            RequestStatus::Pending.decide(Decision::Reject),
            Ok(RequestStatus::Rejected)
        );
    }

    #[test]
    fn test_terminal_states_reject_decisions() {
        for status in [RequestStatus::Approved, RequestStatus::Rejected] {
            assert!(status.is_terminal());
            assert_eq!(status.decide(Decision::Approve), Err(SchoolError::NotPending));
            assert_eq!(status.decide(Decision::Reject), Err(SchoolError::NotPending));
            assert_eq!(status.ensure_editable(), Err(SchoolError::NotPending));
        }
    }

    #[test]
    fn test_apply_decision_stamps_actor() {
        let mut request = pending();
        let at = Utc::now();
        request.apply_decision(Decision::Reject, "T1", at).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.rejected_by.as_deref(), Some("T1"));
        assert_eq!(request.rejected_at, Some(at));
        assert!(request.approved_by.is_none());
    }

    #[test]
    fn test_edit_after_decision_leaves_request_untouched() {
        let mut request = pending();
        request.apply_decision(Decision::Approve, "T1", Utc::now()).unwrap();
        let before = request.clone();

        let edit = AbsenceRequestEdit {
            reason: Some("cold".to_string()),
            ..Default::default()
        };
        assert_eq!(request.apply_edit(&edit, Utc::now()), Err(SchoolError::NotPending));
        assert_eq!(request, before);
    }

    #[test]
    fn test_parse_request_date() {
        assert_eq!(
            parse_request_date("2024-03-01", "%Y-%m-%d").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(matches!(
            parse_request_date("01/03/2024", "%Y-%m-%d"),
            Err(SchoolError::InvalidDate(_))
        ));
        assert!(parse_request_date("2024-02-30", "%Y-%m-%d").is_err());
    }
}
