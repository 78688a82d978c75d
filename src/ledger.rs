use chrono::NaiveDate;

use crate::models::{AttendanceRecord, AttendanceStatus};

/// Date-keyed attendance history for one enrollment session. Holds at most
/// one record per distinct date; a later mark for the same date supersedes
/// the earlier one.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<AttendanceRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from store rows. The store keys rows by
    /// (enrollment_session_id, date), so the one-per-date invariant already
    /// holds; records are kept in date order for stable output.
    pub fn from_records(mut records: Vec<AttendanceRecord>) -> Self {
        records.sort_by_key(|record| record.date);
        Self { records }
    }

    /// Insert-or-replace: drops any record for the same date, then appends.
    pub fn upsert(&mut self, record: AttendanceRecord) {
        self.records.retain(|existing| existing.date != record.date);
        self.records.push(record);
        self.records.sort_by_key(|existing| existing.date);
    }

    pub fn status_on(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.records
            .iter()
            .find(|record| record.date == date)
            .map(|record| record.status)
    }

    /// Records with `start <= date <= end`, inclusive on both bounds.
    pub fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &AttendanceRecord> {
        self.records
            .iter()
            .filter(move |record| record.date >= start && record.date <= end)
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
