//! 출결 도메인 모델.

pub mod absence;
pub mod attendance;
pub mod page;
pub mod principal;
pub mod role;

pub use absence::{
    parse_request_date, AbsenceRequest, AbsenceRequestEdit, Decision, NewAbsenceRequest,
    RequestStatus,
};
pub use attendance::{AttendancePatch, AttendanceRecord, AttendanceStatus, NewAttendance};
pub use page::{Page, PageRequest};
pub use principal::{Identity, Principal, Session};
pub use role::{Permission, Role};
