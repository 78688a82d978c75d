use std::collections::BTreeSet;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::AttendanceError;
use crate::ledger::Ledger;
use crate::models::{
    AttendanceRecord, Customer, EnrollmentKind, EnrollmentSession, InstructorRecord,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Reconstructs the tagged enrollment kind from its stored columns. Unknown
/// type strings fail loudly instead of silently dropping the customer from
/// every roster.
fn decode_kind(
    enrollment_type: &str,
    trial_date: Option<NaiveDate>,
    partial_dates: Option<Vec<NaiveDate>>,
) -> Result<EnrollmentKind, AttendanceError> {
    match enrollment_type {
        "full" => Ok(EnrollmentKind::Full),
        "trial" => {
            let trial_date = trial_date.ok_or_else(|| {
                AttendanceError::Validation("trial enrollment is missing its trial date".to_string())
            })?;
            Ok(EnrollmentKind::Trial { trial_date })
        }
        "partial" => Ok(EnrollmentKind::Partial {
            dates: partial_dates
                .unwrap_or_default()
                .into_iter()
                .collect::<BTreeSet<NaiveDate>>(),
        }),
        other => Err(AttendanceError::Validation(format!(
            "unrecognized enrollment type '{other}'"
        ))),
    }
}

fn decode_session(row: &sqlx::postgres::PgRow) -> Result<EnrollmentSession, AttendanceError> {
    let kind = decode_kind(
        row.get::<&str, _>("enrollment_type"),
        row.get("trial_date"),
        row.get("partial_dates"),
    )?;

    Ok(EnrollmentSession {
        id: row.get("id"),
        enrollment_id: row.get("enrollment_id"),
        session_id: row.get("session_id"),
        kind,
        customer: Customer {
            first_name: row.get("first_name"),
            surname: row.get("surname"),
            email: row.get("email"),
            contact_no: row.get("contact_no"),
        },
        ledger: Ledger::new(),
    })
}

fn decode_attendance(row: &sqlx::postgres::PgRow) -> Result<AttendanceRecord, AttendanceError> {
    Ok(AttendanceRecord {
        date: row.get("date"),
        status: row.get::<&str, _>("status").parse()?,
        marked_by: row.get("marked_by"),
        marked_at: row.get("marked_at"),
    })
}

const SESSION_COLUMNS: &str = "es.id, es.enrollment_id, es.session_id, es.enrollment_type, \
     es.trial_date, es.partial_dates, c.first_name, c.surname, c.email, c.contact_no";

/// All enrollment sessions under one class session, ledgers loaded. An
/// unknown class session yields an empty list, which is a valid state.
pub async fn fetch_sessions(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Vec<EnrollmentSession>, AttendanceError> {
    let query = format!(
        "SELECT {SESSION_COLUMNS} \
         FROM attendance_engine.enrollment_sessions es \
         JOIN attendance_engine.enrollments e ON e.id = es.enrollment_id \
         JOIN attendance_engine.customers c ON c.id = e.customer_id \
         WHERE es.session_id = $1"
    );
    let rows = sqlx::query(&query).bind(session_id).fetch_all(pool).await?;

    let mut sessions = Vec::with_capacity(rows.len());
    for row in &rows {
        sessions.push(decode_session(row)?);
    }

    load_ledgers(pool, &mut sessions).await?;
    Ok(sessions)
}

pub async fn session_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<EnrollmentSession>, AttendanceError> {
    let query = format!(
        "SELECT {SESSION_COLUMNS} \
         FROM attendance_engine.enrollment_sessions es \
         JOIN attendance_engine.enrollments e ON e.id = es.enrollment_id \
         JOIN attendance_engine.customers c ON c.id = e.customer_id \
         WHERE es.id = $1"
    );
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;

    match row {
        Some(row) => {
            let mut sessions = vec![decode_session(&row)?];
            load_ledgers(pool, &mut sessions).await?;
            Ok(sessions.pop())
        }
        None => Ok(None),
    }
}

async fn load_ledgers(
    pool: &PgPool,
    sessions: &mut [EnrollmentSession],
) -> Result<(), AttendanceError> {
    if sessions.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = sessions.iter().map(|session| session.id).collect();
    let rows = sqlx::query(
        "SELECT enrollment_session_id, date, status, marked_by, marked_at \
         FROM attendance_engine.attendance_records \
         WHERE enrollment_session_id = ANY($1) \
         ORDER BY date",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    for session in sessions.iter_mut() {
        let mut records = Vec::new();
        for row in &rows {
            if row.get::<Uuid, _>("enrollment_session_id") == session.id {
                records.push(decode_attendance(row)?);
            }
        }
        session.ledger = Ledger::from_records(records);
    }

    Ok(())
}

pub async fn instructor_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<InstructorRecord>, AttendanceError> {
    let row = sqlx::query(
        "SELECT id, full_name, email FROM attendance_engine.instructors WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| InstructorRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
    }))
}

/// Atomic per-row upsert keyed by (enrollment_session_id, date). Concurrent
/// marks for different dates touch different rows; marks for the same date
/// serialize at the row, last writer winning.
pub async fn upsert_attendance(
    pool: &PgPool,
    enrollment_session_id: Uuid,
    record: &AttendanceRecord,
) -> Result<(), AttendanceError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_engine.attendance_records
        (enrollment_session_id, date, status, marked_by, marked_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (enrollment_session_id, date) DO UPDATE
        SET status = EXCLUDED.status,
            marked_by = EXCLUDED.marked_by,
            marked_at = EXCLUDED.marked_at
        "#,
    )
    .bind(enrollment_session_id)
    .bind(record.date)
    .bind(record.status.as_str())
    .bind(record.marked_by)
    .bind(record.marked_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let instructor_id = Uuid::parse_str("7b1f4c9a-51d3-4f0e-9a8e-2d6c1b5e8f03")?;
    sqlx::query(
        r#"
        INSERT INTO attendance_engine.instructors (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        "#,
    )
    .bind(instructor_id)
    .bind("Dana Whitfield")
    .bind("dana.whitfield@example.com")
    .execute(pool)
    .await?;

    let class_session_id = Uuid::parse_str("f0a2b7d4-8c3e-4b51-b1a9-5e7d2c4f6a18")?;
    let march = |day: u32| {
        NaiveDate::from_ymd_opt(2024, 3, day).context("invalid seed date")
    };

    let customers = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery",
            "Lee",
            "avery.lee@example.com",
            "555-0101",
            "full",
            None,
            None,
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules",
            "Moreno",
            "jules.moreno@example.com",
            "555-0102",
            "trial",
            Some(march(5)?),
            None,
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara",
            "Patel",
            "kiara.patel@example.com",
            "555-0103",
            "partial",
            None,
            Some(vec![march(5)?, march(19)?]),
        ),
    ];

    for (customer_id, first_name, surname, email, contact_no, enrollment_type, trial_date, partial_dates) in
        customers
    {
        sqlx::query(
            r#"
            INSERT INTO attendance_engine.customers (id, first_name, surname, email, contact_no)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name, surname = EXCLUDED.surname,
                contact_no = EXCLUDED.contact_no
            "#,
        )
        .bind(customer_id)
        .bind(first_name)
        .bind(surname)
        .bind(email)
        .bind(contact_no)
        .execute(pool)
        .await?;

        let existing: Option<Uuid> = sqlx::query(
            "SELECT id FROM attendance_engine.enrollments WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_optional(pool)
        .await?
        .map(|row| row.get("id"));

        let enrollment_id = match existing {
            Some(id) => id,
            None => sqlx::query(
                "INSERT INTO attendance_engine.enrollments (id, customer_id) \
                 VALUES ($1, $2) RETURNING id",
            )
            .bind(Uuid::new_v4())
            .bind(customer_id)
            .fetch_one(pool)
            .await?
            .get("id"),
        };

        sqlx::query(
            r#"
            INSERT INTO attendance_engine.enrollment_sessions
            (id, enrollment_id, session_id, enrollment_type, trial_date, partial_dates)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (enrollment_id, session_id) DO UPDATE
            SET enrollment_type = EXCLUDED.enrollment_type,
                trial_date = EXCLUDED.trial_date,
                partial_dates = EXCLUDED.partial_dates
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(enrollment_id)
        .bind(class_session_id)
        .bind(enrollment_type)
        .bind(trial_date)
        .bind(partial_dates)
        .execute(pool)
        .await?;
    }

    // A few marks on the full enrollment so roster/report have output.
    let sessions = fetch_sessions(pool, class_session_id).await?;
    if let Some(full) = sessions
        .iter()
        .find(|session| session.kind == EnrollmentKind::Full)
    {
        for (day, status) in [(5, "present"), (12, "present"), (19, "absent")] {
            let record = AttendanceRecord {
                date: march(day)?,
                status: status.parse()?,
                marked_by: instructor_id,
                marked_at: chrono::Utc::now(),
            };
            upsert_attendance(pool, full.id, &record).await?;
        }
    }

    Ok(())
}
