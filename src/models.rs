use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::AttendanceError;
use crate::ledger::Ledger;

/// Enrollment-type-specific eligibility data. Each variant carries exactly the
/// date data that governs it, so an unrecognized type cannot exist in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentKind {
    Full,
    Trial { trial_date: NaiveDate },
    Partial { dates: BTreeSet<NaiveDate> },
}

impl EnrollmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            EnrollmentKind::Full => "full",
            EnrollmentKind::Trial { .. } => "trial",
            EnrollmentKind::Partial { .. } => "partial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AttendanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            other => Err(AttendanceError::Validation(format!(
                "unrecognized attendance status '{other}' (expected present, absent or late)"
            ))),
        }
    }
}

/// One day's outcome for one enrollment session. Superseded wholesale by a
/// later mark for the same date, never amended.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Uuid,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub contact_no: String,
}

/// One customer's participation record in one recurring class session.
#[derive(Debug, Clone)]
pub struct EnrollmentSession {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub session_id: Uuid,
    pub kind: EnrollmentKind,
    pub customer: Customer,
    pub ledger: Ledger,
}

#[derive(Debug, Clone)]
pub struct InstructorRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// Roster row: one eligible customer with their status for the query date.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerAttendance {
    pub enrollment_session_id: Uuid,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub contact_no: String,
    #[serde(serialize_with = "serialize_roster_status")]
    pub attendance_status: Option<AttendanceStatus>,
}

fn serialize_roster_status<S: Serializer>(
    value: &Option<AttendanceStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(status) => serializer.serialize_str(status.as_str()),
        None => serializer.serialize_str("unmarked"),
    }
}

/// Per-customer totals over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub enrollment_session_id: Uuid,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub total_sessions: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
}
