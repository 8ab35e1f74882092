//! Per-subject attendance tracking.
//!
//! Each owner has one document in the `attendance` collection. Its top-level
//! fields are subject names; each value maps ISO dates to `"present"` or
//! `"absent"`:
//!
//! ```text
//! attendance/{owner} = { "Physics": { "2024-03-01": "present", ... }, ... }
//! ```
//!
//! [`AttendanceTracker`] keeps a local copy of one subject's map and writes
//! the whole map back on every toggle.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::events::Event;
use crate::metrics::{self, AttendanceSummary};
use crate::store::{DocumentStore, Fields};

pub const ATTENDANCE_COLLECTION: &str = "attendance";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    /// Next status for a date currently in `current`.
    /// Unmarked dates become present.
    pub fn toggled(current: Option<Self>) -> Self {
        match current {
            Some(AttendanceStatus::Present) => AttendanceStatus::Absent,
            _ => AttendanceStatus::Present,
        }
    }
}

/// Latest status per date for one subject.
pub type AttendanceMap = BTreeMap<NaiveDate, AttendanceStatus>;

/// Map a stored subject value into a typed [`AttendanceMap`].
///
/// Entries with an unparseable date or status are dropped.
pub fn decode_subject_map(subject: &str, value: &Value) -> AttendanceMap {
    let mut map = AttendanceMap::new();
    let Some(entries) = value.as_object() else {
        tracing::warn!(subject, "attendance entry is not a map; ignoring");
        return map;
    };
    for (date, status) in entries {
        let parsed_date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok();
        let parsed_status = status.as_str().and_then(AttendanceStatus::parse);
        match (parsed_date, parsed_status) {
            (Some(d), Some(s)) => {
                map.insert(d, s);
            }
            _ => tracing::warn!(subject, date = %date, status = %status, "skipping malformed attendance record"),
        }
    }
    map
}

/// Inverse of [`decode_subject_map`].
pub fn encode_subject_map(map: &AttendanceMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(date, status)| {
                (
                    date.format(DATE_FORMAT).to_string(),
                    Value::String(status.as_str().to_string()),
                )
            })
            .collect(),
    )
}

/// Attendance for one subject of one owner.
pub struct AttendanceTracker<'a> {
    store: &'a dyn DocumentStore,
    owner: String,
    subject: String,
    records: AttendanceMap,
}

impl<'a> AttendanceTracker<'a> {
    /// Fetch the subject's records; an absent document or subject is empty.
    pub fn load(store: &'a dyn DocumentStore, owner: &str, subject: &str) -> Result<Self> {
        let records = store
            .get(ATTENDANCE_COLLECTION, owner)?
            .and_then(|doc| doc.field(subject).map(|v| decode_subject_map(subject, v)))
            .unwrap_or_default();

        Ok(Self {
            store,
            owner: owner.to_string(),
            subject: subject.to_string(),
            records,
        })
    }

    /// Subjects that have an entry in the owner's attendance document.
    pub fn subjects_with_records(store: &dyn DocumentStore, owner: &str) -> Result<Vec<String>> {
        Ok(store
            .get(ATTENDANCE_COLLECTION, owner)?
            .map(|doc| doc.fields.keys().cloned().collect())
            .unwrap_or_default())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn records(&self) -> &AttendanceMap {
        &self.records
    }

    pub fn status(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.records.get(&date).copied()
    }

    pub fn summary(&self) -> AttendanceSummary {
        metrics::attendance_summary(&self.records)
    }

    /// Flip the status of `date` and write the subject's full map back.
    ///
    /// The local copy changes first. The write tries `update` on the
    /// existing document and falls back to a merge-create if that fails.
    /// If the fallback fails too the error is returned and the local copy
    /// keeps the new status.
    pub fn toggle(&mut self, date: NaiveDate) -> Result<AttendanceStatus> {
        let status = AttendanceStatus::toggled(self.status(date));
        self.records.insert(date, status);

        let encoded = encode_subject_map(&self.records);
        if let Err(e) = self.store.update(
            ATTENDANCE_COLLECTION,
            &self.owner,
            &self.subject,
            encoded.clone(),
        ) {
            tracing::warn!(error = %e, subject = %self.subject, "attendance update failed, merging instead");
            let mut patch = Fields::new();
            patch.insert(self.subject.clone(), encoded);
            if let Err(e) = self
                .store
                .set_merge(ATTENDANCE_COLLECTION, &self.owner, patch)
            {
                tracing::error!(error = %e, subject = %self.subject, "attendance write failed");
                return Err(e.into());
            }
        }

        tracing::info!(subject = %self.subject, %date, status = status.as_str(), "attendance toggled");
        Ok(status)
    }

    /// Toggle today's date (local calendar).
    pub fn toggle_today(&mut self) -> Result<AttendanceStatus> {
        self.toggle(Local::now().date_naive())
    }

    /// Toggle and describe the change as an [`Event`].
    pub fn toggle_event(&mut self, date: NaiveDate) -> Result<Event> {
        let status = self.toggle(date)?;
        Ok(Event::AttendanceToggled {
            subject: self.subject.clone(),
            date,
            status,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn toggle_cycles_between_present_and_absent() {
        assert_eq!(AttendanceStatus::toggled(None), AttendanceStatus::Present);
        assert_eq!(
            AttendanceStatus::toggled(Some(AttendanceStatus::Present)),
            AttendanceStatus::Absent
        );
        assert_eq!(
            AttendanceStatus::toggled(Some(AttendanceStatus::Absent)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn load_missing_document_is_empty() {
        let store = MemoryStore::new();
        let tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        assert!(tracker.records().is_empty());
        assert_eq!(tracker.summary().percentage, 0);
    }

    #[test]
    fn first_toggle_creates_document() {
        let store = MemoryStore::new();
        let mut tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        let status = tracker.toggle(date("2024-03-01")).unwrap();
        assert_eq!(status, AttendanceStatus::Present);

        let doc = store.get(ATTENDANCE_COLLECTION, "u1").unwrap().unwrap();
        assert_eq!(doc.field("Math"), Some(&json!({"2024-03-01": "present"})));
    }

    #[test]
    fn double_toggle_is_identity_on_existing_status() {
        let store = MemoryStore::new();
        let mut tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        let d = date("2024-03-01");
        tracker.toggle(d).unwrap();
        let before = tracker.status(d);
        tracker.toggle(d).unwrap();
        tracker.toggle(d).unwrap();
        assert_eq!(tracker.status(d), before);
    }

    #[test]
    fn toggle_keeps_other_subjects() {
        let store = MemoryStore::new();
        AttendanceTracker::load(&store, "u1", "Math")
            .unwrap()
            .toggle(date("2024-03-01"))
            .unwrap();
        AttendanceTracker::load(&store, "u1", "Art")
            .unwrap()
            .toggle(date("2024-03-02"))
            .unwrap();

        let mut subjects = AttendanceTracker::subjects_with_records(&store, "u1").unwrap();
        subjects.sort();
        assert_eq!(subjects, vec!["Art".to_string(), "Math".to_string()]);
    }

    #[test]
    fn failed_update_falls_back_to_merge() {
        let store = MemoryStore::new();
        let mut tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        tracker.toggle(date("2024-03-01")).unwrap();

        store.fail_updates(true);
        tracker.toggle(date("2024-03-02")).unwrap();

        let reloaded = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        assert_eq!(reloaded.records().len(), 2);
    }

    #[test]
    fn failed_fallback_surfaces_error_but_keeps_local_state() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let mut tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        assert!(tracker.toggle(date("2024-03-01")).is_err());
        assert_eq!(
            tracker.status(date("2024-03-01")),
            Some(AttendanceStatus::Present)
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let map = decode_subject_map(
            "Math",
            &json!({"2024-03-01": "present", "yesterday": "present", "2024-03-02": "late"}),
        );
        assert_eq!(map.len(), 1);
        assert!(decode_subject_map("Math", &json!(["x"])).is_empty());
    }

    #[test]
    fn toggle_today_marks_local_date() {
        let store = MemoryStore::new();
        let mut tracker = AttendanceTracker::load(&store, "u1", "Math").unwrap();
        let before = Local::now().date_naive();
        assert_eq!(tracker.toggle_today().unwrap(), AttendanceStatus::Present);
        let after = Local::now().date_naive();
        assert!(
            tracker.status(before) == Some(AttendanceStatus::Present)
                || tracker.status(after) == Some(AttendanceStatus::Present)
        );
    }
}
