//! 역할 기반 접근 제어 (RBAC).
//!
//! 사용자 역할 및 권한 정의.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 세 역할은 각각 독립된 자격증명 테이블을 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 계정/학급 관리, 출석 정정
    Admin,
    /// 교사 - 결석 신청 승인/반려
    Teacher,
    /// 학생 - 본인 출석 체크, 결석 신청
    Student,
}

impl Role {
    /// 역할이 특정 권한을 가지는지 확인.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => matches!(
                permission,
                Permission::CorrectAttendance
                    | Permission::DeleteAttendance
                    | Permission::DeleteAbsenceRequest
                    | Permission::ViewAbsenceRequests
                    | Permission::ManagePrincipals
            ),
            Role::Teacher => matches!(
                permission,
                Permission::DeleteAttendance
                    | Permission::DecideAbsenceRequest
                    | Permission::DeleteAbsenceRequest
                    | Permission::ViewAbsenceRequests
            ),
            Role::Student => matches!(
                permission,
                Permission::MarkOwnAttendance | Permission::SubmitAbsenceRequest
            ),
        }
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    /// 직렬화 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
            .ok_or_else(|| crate::SchoolError::Validation(format!("알 수 없는 사용자 유형: {}", s)))
    }
}

/// 시스템 권한.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// 본인 출석 체크
    MarkOwnAttendance,
    /// 출석 기록 정정
    CorrectAttendance,
    /// 출석 기록 삭제 (soft delete)
    DeleteAttendance,
    /// 결석 신청 제출/수정
    SubmitAbsenceRequest,
    /// 결석 신청 승인/반려
    DecideAbsenceRequest,
    /// 결석 신청 삭제 (soft delete)
    DeleteAbsenceRequest,
    /// 결석 신청 목록 조회
    ViewAbsenceRequests,
    /// 계정 비밀번호 초기화/활성화 관리
    ManagePrincipals,
}

impl Permission {
    /// 권한에 대한 설명 반환.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::MarkOwnAttendance => "본인 출석 체크",
            Permission::CorrectAttendance => "출석 기록 정정",
            Permission::DeleteAttendance => "출석 기록 삭제",
            Permission::SubmitAbsenceRequest => "결석 신청",
            Permission::DecideAbsenceRequest => "결석 신청 결정",
            Permission::DeleteAbsenceRequest => "결석 신청 삭제",
            Permission::ViewAbsenceRequests => "결석 신청 조회",
            Permission::ManagePrincipals => "계정 관리",
        }
    }
}
