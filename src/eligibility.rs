use chrono::NaiveDate;

use crate::models::EnrollmentKind;

/// Decides whether an enrollment session's customer should be considered for
/// attendance tracking on `on`. Full enrollments track every occurrence the
/// scheduling subsystem produces; trial enrollments track exactly their trial
/// date; partial enrollments track exactly their chosen dates.
pub fn is_eligible(kind: &EnrollmentKind, on: NaiveDate) -> bool {
    match kind {
        EnrollmentKind::Full => true,
        EnrollmentKind::Trial { trial_date } => *trial_date == on,
        EnrollmentKind::Partial { dates } => dates.contains(&on),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn full_enrollments_are_eligible_on_any_date() {
        for day in ["2024-03-05", "2024-12-25", "1999-01-01"] {
            assert!(is_eligible(&EnrollmentKind::Full, date(day)));
        }
    }

    #[test]
    fn trial_enrollments_match_only_their_trial_date() {
        let kind = EnrollmentKind::Trial {
            trial_date: date("2024-03-05"),
        };
        assert!(is_eligible(&kind, date("2024-03-05")));
        assert!(!is_eligible(&kind, date("2024-03-12")));
        // On-or-after does not apply; equality is exact.
        assert!(!is_eligible(&kind, date("2024-03-06")));
    }

    #[test]
    fn partial_enrollments_match_set_membership() {
        let kind = EnrollmentKind::Partial {
            dates: BTreeSet::from([date("2024-03-05"), date("2024-03-19")]),
        };
        assert!(!is_eligible(&kind, date("2024-03-12")));
        assert!(is_eligible(&kind, date("2024-03-19")));
    }

    #[test]
    fn empty_partial_set_is_never_eligible() {
        let kind = EnrollmentKind::Partial {
            dates: BTreeSet::new(),
        };
        assert!(!is_eligible(&kind, date("2024-03-05")));
    }
}
