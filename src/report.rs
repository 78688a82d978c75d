use std::path::Path;

use chrono::NaiveDate;

use crate::models::{AttendanceStatus, AttendanceSummary, EnrollmentSession};

/// Aggregates each session's ledger over `start..=end` into per-customer
/// totals. Recomputable at any time from current ledger state; sessions with
/// no records in the range still appear with zero counts.
pub fn summarize(
    sessions: &[EnrollmentSession],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<AttendanceSummary> {
    let mut summaries: Vec<AttendanceSummary> = sessions
        .iter()
        .map(|session| {
            let mut present_count = 0;
            let mut absent_count = 0;
            let mut late_count = 0;

            for record in session.ledger.in_range(start, end) {
                match record.status {
                    AttendanceStatus::Present => present_count += 1,
                    AttendanceStatus::Absent => absent_count += 1,
                    AttendanceStatus::Late => late_count += 1,
                }
            }

            AttendanceSummary {
                enrollment_session_id: session.id,
                first_name: session.customer.first_name.clone(),
                surname: session.customer.surname.clone(),
                email: session.customer.email.clone(),
                total_sessions: present_count + absent_count + late_count,
                present_count,
                absent_count,
                late_count,
            }
        })
        .collect();

    summaries.sort_by(|a, b| (&a.surname, &a.first_name).cmp(&(&b.surname, &b.first_name)));
    summaries
}

/// Writes summaries as CSV for spreadsheet hand-off.
pub fn write_csv(path: &Path, summaries: &[AttendanceSummary]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::ledger::Ledger;
    use crate::models::{AttendanceRecord, Customer, EnrollmentKind};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn session_with_marks(marks: &[(&str, AttendanceStatus)]) -> EnrollmentSession {
        let mut ledger = Ledger::new();
        for (day, status) in marks {
            ledger.upsert(AttendanceRecord {
                date: date(day),
                status: *status,
                marked_by: Uuid::new_v4(),
                marked_at: Utc::now(),
            });
        }
        EnrollmentSession {
            id: Uuid::new_v4(),
            enrollment_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            kind: EnrollmentKind::Full,
            customer: Customer {
                first_name: "Sam".to_string(),
                surname: "Okafor".to_string(),
                email: "sam.okafor@example.com".to_string(),
                contact_no: "555-0101".to_string(),
            },
            ledger,
        }
    }

    #[test]
    fn counts_split_by_status_within_the_range() {
        let session = session_with_marks(&[
            ("2024-03-03", AttendanceStatus::Present),
            ("2024-03-10", AttendanceStatus::Present),
            ("2024-03-17", AttendanceStatus::Absent),
        ]);

        let summaries = summarize(&[session], date("2024-03-01"), date("2024-03-31"));
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.present_count, 2);
        assert_eq!(summary.absent_count, 1);
        assert_eq!(summary.late_count, 0);
    }

    #[test]
    fn totals_equal_the_sum_of_status_counts() {
        let session = session_with_marks(&[
            ("2024-03-01", AttendanceStatus::Late),
            ("2024-03-08", AttendanceStatus::Present),
            ("2024-03-15", AttendanceStatus::Absent),
            ("2024-03-22", AttendanceStatus::Late),
        ]);

        let summaries = summarize(&[session], date("2024-01-01"), date("2024-12-31"));
        let summary = &summaries[0];
        assert_eq!(
            summary.total_sessions,
            summary.present_count + summary.absent_count + summary.late_count
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let session = session_with_marks(&[
            ("2024-02-29", AttendanceStatus::Present),
            ("2024-03-01", AttendanceStatus::Present),
            ("2024-03-31", AttendanceStatus::Absent),
            ("2024-04-01", AttendanceStatus::Absent),
        ]);

        let summaries = summarize(&[session], date("2024-03-01"), date("2024-03-31"));
        assert_eq!(summaries[0].total_sessions, 2);
        assert_eq!(summaries[0].present_count, 1);
        assert_eq!(summaries[0].absent_count, 1);
    }

    #[test]
    fn session_with_nothing_in_range_reports_zeros() {
        let session = session_with_marks(&[("2024-05-01", AttendanceStatus::Present)]);
        let summaries = summarize(&[session], date("2024-03-01"), date("2024-03-31"));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_sessions, 0);
    }

    #[test]
    fn csv_export_writes_one_row_per_summary() {
        let session = session_with_marks(&[("2024-03-03", AttendanceStatus::Present)]);
        let summaries = summarize(&[session], date("2024-03-01"), date("2024-03-31"));

        let dir = std::env::temp_dir().join(format!("attendance-report-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("summary.csv");
        write_csv(&path, &summaries).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().contains("present_count"));
        assert_eq!(lines.count(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
