//! # Studyroom Core Library
//!
//! This library provides the core logic behind Studyroom, a student
//! productivity tool. Every operation is available through the standalone
//! CLI binary; a graphical front end would be a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: focus/break countdown driven by `tick()`, persisted
//!   against the wall clock so a restart resumes without drift
//! - **Document Store**: the synchronized data lives in a document database
//!   behind the [`DocumentStore`] trait; SQLite is the bundled backend
//! - **Adapters**: attendance, calendar events and the GPA record map typed
//!   models onto store documents
//! - **Metrics**: pure functions that turn stored records into percentages,
//!   chart series and grade-point averages
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: focus/break state machine
//! - [`AttendanceTracker`]: per-subject attendance with write-through toggles
//! - [`EventBoard`] and [`ReminderScheduler`]: calendar events and reminders
//! - [`GradeBook`]: SGPA/CGPA record persistence
//! - [`Database`]: SQLite document store and local slots
//! - [`Config`]: application configuration

pub mod academic;
pub mod attendance;
pub mod error;
pub mod events;
pub mod metrics;
pub mod planner;
pub mod profile;
pub mod storage;
pub mod store;
pub mod timer;

pub use academic::{AcademicRecord, GradeBook, Semester, SubjectEntry, SubjectField};
pub use attendance::{AttendanceMap, AttendanceStatus, AttendanceTracker};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use metrics::{AttendanceSummary, EngagementLevel};
pub use planner::reminder::{Notifier, Reminder, ReminderScheduler};
pub use planner::{CalendarEvent, EventBoard, NewEvent};
pub use profile::ProfileStore;
pub use storage::{Config, Database, LocalPrefs, Theme, TodoItem};
pub use store::{Document, DocumentStore, MemoryStore};
pub use timer::{Phase, PersistedTimer, TimerDurations, TimerEngine};
