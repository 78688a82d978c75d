use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::eligibility;
use crate::error::AttendanceError;
use crate::models::{AttendanceRecord, AttendanceStatus, AttendanceSummary, CustomerAttendance};
use crate::report;
use crate::roster;

/// Uniform result envelope shared by all three exposed operations. Engine
/// faults are caught at the operation boundary and folded in here; nothing
/// propagates to the caller as a panic or bare error.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: &AttendanceError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Receipt for a successful mark, echoing what was recorded and by whom.
#[derive(Debug, Serialize)]
pub struct MarkReceipt {
    pub enrollment_session_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Uuid,
}

pub async fn get_roster(
    pool: &PgPool,
    session_id: Uuid,
    date: NaiveDate,
) -> ApiResponse<Vec<CustomerAttendance>> {
    match roster_inner(pool, session_id, date).await {
        Ok(rows) => ApiResponse::ok(rows),
        Err(err) => {
            tracing::error!(%session_id, %date, kind = err.kind(), "roster failed: {err}");
            ApiResponse::fail(&err)
        }
    }
}

async fn roster_inner(
    pool: &PgPool,
    session_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<CustomerAttendance>, AttendanceError> {
    let sessions = db::fetch_sessions(pool, session_id).await?;
    tracing::debug!(%session_id, fetched = sessions.len(), "building roster");
    Ok(roster::build_roster(&sessions, date))
}

pub async fn mark_attendance(
    pool: &PgPool,
    enrollment_session_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
    instructor_email: &str,
) -> ApiResponse<MarkReceipt> {
    match mark_inner(pool, enrollment_session_id, date, status, instructor_email).await {
        Ok(receipt) => ApiResponse::ok(receipt),
        Err(err) => {
            tracing::error!(
                %enrollment_session_id,
                %date,
                kind = err.kind(),
                "mark attendance failed: {err}"
            );
            ApiResponse::fail(&err)
        }
    }
}

async fn mark_inner(
    pool: &PgPool,
    enrollment_session_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
    instructor_email: &str,
) -> Result<MarkReceipt, AttendanceError> {
    let instructor = db::instructor_by_email(pool, instructor_email)
        .await?
        .ok_or_else(|| {
            AttendanceError::Authorization(format!(
                "no instructor record for '{instructor_email}'"
            ))
        })?;

    let session = db::session_by_id(pool, enrollment_session_id)
        .await?
        .ok_or_else(|| {
            AttendanceError::NotFound(format!("enrollment session {enrollment_session_id}"))
        })?;

    if !eligibility::is_eligible(&session.kind, date) {
        tracing::warn!(
            %enrollment_session_id,
            %date,
            enrollment_type = session.kind.label(),
            "marking attendance for a date the session is not eligible on"
        );
    }

    let record = AttendanceRecord {
        date,
        status,
        marked_by: instructor.id,
        marked_at: Utc::now(),
    };
    db::upsert_attendance(pool, session.id, &record).await?;

    tracing::info!(
        %enrollment_session_id,
        %date,
        status = %status,
        instructor = %instructor.email,
        "attendance recorded"
    );

    Ok(MarkReceipt {
        enrollment_session_id: session.id,
        date,
        status,
        marked_by: instructor.id,
    })
}

pub async fn get_report(
    pool: &PgPool,
    session_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> ApiResponse<Vec<AttendanceSummary>> {
    match report_inner(pool, session_id, start, end).await {
        Ok(summaries) => ApiResponse::ok(summaries),
        Err(err) => {
            tracing::error!(%session_id, kind = err.kind(), "report failed: {err}");
            ApiResponse::fail(&err)
        }
    }
}

async fn report_inner(
    pool: &PgPool,
    session_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceSummary>, AttendanceError> {
    if start > end {
        return Err(AttendanceError::Validation(format!(
            "report range is inverted ({start} > {end})"
        )));
    }
    let sessions = db::fetch_sessions(pool, session_id).await?;
    Ok(report::summarize(&sessions, start, end))
}
