use chrono::NaiveDate;

use crate::eligibility;
use crate::models::{CustomerAttendance, EnrollmentSession};

/// Builds the per-date roster: every session eligible on `date`, annotated
/// with the marked status for that date or left unmarked. Ineligible
/// sessions are excluded entirely. Pure read; never touches a ledger.
pub fn build_roster(sessions: &[EnrollmentSession], date: NaiveDate) -> Vec<CustomerAttendance> {
    let mut roster: Vec<CustomerAttendance> = sessions
        .iter()
        .filter(|session| eligibility::is_eligible(&session.kind, date))
        .map(|session| CustomerAttendance {
            enrollment_session_id: session.id,
            first_name: session.customer.first_name.clone(),
            surname: session.customer.surname.clone(),
            email: session.customer.email.clone(),
            contact_no: session.customer.contact_no.clone(),
            attendance_status: session.ledger.status_on(date),
        })
        .collect();

    roster.sort_by(|a, b| (&a.surname, &a.first_name).cmp(&(&b.surname, &b.first_name)));
    roster
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::ledger::Ledger;
    use crate::models::{AttendanceRecord, AttendanceStatus, Customer, EnrollmentKind};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn session(surname: &str, kind: EnrollmentKind) -> EnrollmentSession {
        EnrollmentSession {
            id: Uuid::new_v4(),
            enrollment_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            kind,
            customer: Customer {
                first_name: "Sam".to_string(),
                surname: surname.to_string(),
                email: format!("{}@example.com", surname.to_lowercase()),
                contact_no: "555-0101".to_string(),
            },
            ledger: Ledger::new(),
        }
    }

    fn mark(session: &mut EnrollmentSession, day: &str, status: AttendanceStatus) {
        session.ledger.upsert(AttendanceRecord {
            date: date(day),
            status,
            marked_by: Uuid::new_v4(),
            marked_at: Utc::now(),
        });
    }

    #[test]
    fn ineligible_sessions_never_appear() {
        let trial = session(
            "Okafor",
            EnrollmentKind::Trial {
                trial_date: date("2024-03-05"),
            },
        );
        let partial = session(
            "Lindqvist",
            EnrollmentKind::Partial {
                dates: BTreeSet::from([date("2024-03-19")]),
            },
        );
        let roster = build_roster(&[trial, partial], date("2024-03-12"));
        assert!(roster.is_empty());
    }

    #[test]
    fn full_session_without_marks_is_unmarked() {
        let full = session("Okafor", EnrollmentKind::Full);
        let id = full.id;
        let roster = build_roster(&[full], date("2024-04-01"));

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].enrollment_session_id, id);
        assert_eq!(roster[0].attendance_status, None);
    }

    #[test]
    fn marked_status_for_the_query_date_comes_through() {
        let mut full = session("Okafor", EnrollmentKind::Full);
        mark(&mut full, "2024-03-05", AttendanceStatus::Late);
        mark(&mut full, "2024-03-12", AttendanceStatus::Present);

        let roster = build_roster(&[full], date("2024-03-05"));
        assert_eq!(roster[0].attendance_status, Some(AttendanceStatus::Late));
    }

    #[test]
    fn trial_session_appears_exactly_on_its_trial_date() {
        let trial = session(
            "Okafor",
            EnrollmentKind::Trial {
                trial_date: date("2024-03-05"),
            },
        );
        assert_eq!(build_roster(std::slice::from_ref(&trial), date("2024-03-05")).len(), 1);
        assert!(build_roster(&[trial], date("2024-03-06")).is_empty());
    }

    #[test]
    fn roster_is_ordered_by_customer_name() {
        let a = session("Zhang", EnrollmentKind::Full);
        let b = session("Abara", EnrollmentKind::Full);
        let roster = build_roster(&[a, b], date("2024-03-05"));
        assert_eq!(roster[0].surname, "Abara");
        assert_eq!(roster[1].surname, "Zhang");
    }

    #[test]
    fn no_sessions_is_an_empty_roster_not_a_fault() {
        assert!(build_roster(&[], date("2024-03-05")).is_empty());
    }
}
