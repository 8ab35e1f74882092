use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::AttendanceStatus;
use crate::timer::Phase;

/// Every state change in the system produces an Event.
/// The CLI prints them; the reminder loop emits them as notifications fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero (or was found expired on restore).
    SessionCompleted {
        finished: Phase,
        next: Phase,
        completed_sessions: u32,
        /// Whether the next phase started running on its own.
        auto_continued: bool,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    DurationChanged {
        phase: Phase,
        minutes: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        /// "Focus Time" or "Break Time".
        label: String,
        running: bool,
        remaining_secs: u64,
        display: String,
        completed_sessions: u32,
        focus_minutes: u32,
        break_minutes: u32,
        auto_continue: bool,
        at: DateTime<Utc>,
    },
    AttendanceToggled {
        subject: String,
        date: NaiveDate,
        status: AttendanceStatus,
        at: DateTime<Utc>,
    },
    ReminderFired {
        event_id: String,
        title: String,
        subject: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let ev = Event::TimerReset {
            phase: Phase::Break,
            remaining_secs: 300,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "TimerReset");
        assert_eq!(json["phase"], "break");
        assert_eq!(json["remaining_secs"], 300);
    }
}
