//! Integration tests for attendance, profile and GPA data against SQLite.

use chrono::NaiveDate;
use studyroom_core::metrics;
use studyroom_core::{
    AttendanceStatus, AttendanceTracker, Database, DocumentStore, GradeBook, ProfileStore,
    SubjectField,
};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
}

#[test]
fn toggling_twice_restores_original_status() {
    let db = Database::open_memory().unwrap();
    let mut tracker = AttendanceTracker::load(&db, "u1", "Chemistry").unwrap();

    let present = tracker.toggle(date(2)).unwrap();
    assert_eq!(present, AttendanceStatus::Present);
    tracker.toggle(date(2)).unwrap();
    tracker.toggle(date(2)).unwrap();
    let reloaded = AttendanceTracker::load(&db, "u1", "Chemistry").unwrap();
    assert_eq!(reloaded.status(date(2)), Some(present));

    tracker.toggle(date(4)).unwrap();
    let absent = tracker.toggle(date(4)).unwrap();
    assert_eq!(absent, AttendanceStatus::Absent);
    tracker.toggle(date(4)).unwrap();
    tracker.toggle(date(4)).unwrap();
    let reloaded = AttendanceTracker::load(&db, "u1", "Chemistry").unwrap();
    assert_eq!(reloaded.status(date(4)), Some(absent));
}

#[test]
fn summary_and_series_follow_the_stored_map() {
    let db = Database::open_memory().unwrap();
    let mut tracker = AttendanceTracker::load(&db, "u1", "Chemistry").unwrap();
    tracker.toggle(date(2)).unwrap();
    tracker.toggle(date(3)).unwrap();
    tracker.toggle(date(3)).unwrap();

    let reloaded = AttendanceTracker::load(&db, "u1", "Chemistry").unwrap();
    let summary = reloaded.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.present, 1);
    assert_eq!(summary.percentage, 50);

    let line = metrics::line_series(reloaded.records());
    assert_eq!(line.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1, 0]);
}

#[test]
fn owners_do_not_see_each_other() {
    let db = Database::open_memory().unwrap();
    AttendanceTracker::load(&db, "alice", "Art")
        .unwrap()
        .toggle(date(1))
        .unwrap();
    let bob = AttendanceTracker::load(&db, "bob", "Art").unwrap();
    assert!(bob.records().is_empty());
}

#[test]
fn gpa_save_keeps_subject_list() {
    let db = Database::open_memory().unwrap();
    let mut profile = ProfileStore::load(&db, "u1").unwrap();
    profile.add_subject("Chemistry").unwrap();

    let book = GradeBook::new(&db, "u1");
    let mut record = book.load().unwrap();
    record.set_field(0, 0, SubjectField::Name, "Chemistry").unwrap();
    record.set_field(0, 0, SubjectField::Marks, "84").unwrap();
    record.set_field(0, 0, SubjectField::Credits, "4").unwrap();
    book.save(&record).unwrap();

    let profile = ProfileStore::load(&db, "u1").unwrap();
    assert_eq!(profile.subjects(), ["Chemistry"]);
    assert_eq!(profile.gpa(), Some("9.00"));

    let doc = db.get("users", "u1").unwrap().unwrap();
    assert!(doc.field("semesters").is_some());
}
