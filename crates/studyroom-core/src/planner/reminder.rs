//! Event reminders.
//!
//! A reminder fires a fixed lead time before an event starts. The scheduler
//! keeps one tokio task per pending reminder and throws all of them away
//! whenever it is re-armed, so a changed event list never leaves a stale or
//! duplicate reminder behind.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::CalendarEvent;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Default lead time in minutes.
pub const REMINDER_LEAD_MINUTES: i64 = 5;

pub fn default_lead() -> Duration {
    Duration::minutes(REMINDER_LEAD_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub event_id: String,
    pub title: String,
    pub subject: String,
    pub fire_at: DateTime<Utc>,
}

impl Reminder {
    pub fn notification_title(&self) -> String {
        format!("Reminder: {}", self.title)
    }

    pub fn notification_body(&self) -> String {
        format!("Subject: {}", self.subject)
    }

    pub fn to_event(&self) -> Event {
        Event::ReminderFired {
            event_id: self.event_id.clone(),
            title: self.title.clone(),
            subject: self.subject.clone(),
            at: Utc::now(),
        }
    }
}

/// Reminders for every event starting more than `lead` after `now`,
/// earliest first.
pub fn plan_reminders(
    events: &[CalendarEvent],
    now: DateTime<Utc>,
    lead: Duration,
) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = events
        .iter()
        .filter(|e| e.start - now > lead)
        .map(|e| Reminder {
            event_id: e.id.clone(),
            title: e.title.clone(),
            subject: e.subject.clone(),
            fire_at: e.start - lead,
        })
        .collect();
    reminders.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
    reminders
}

/// Delivers a reminder to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: &Reminder);
}

pub struct ReminderScheduler {
    notifier: Arc<dyn Notifier>,
    lead: Duration,
    armed: Vec<(Reminder, JoinHandle<()>)>,
}

impl ReminderScheduler {
    pub fn new(notifier: Arc<dyn Notifier>, lead: Duration) -> Self {
        Self {
            notifier,
            lead,
            armed: Vec::new(),
        }
    }

    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// Cancel every pending reminder and arm one per event in `events`.
    ///
    /// Must be called from inside a tokio runtime. Returns the number of
    /// reminders armed.
    pub fn rearm(&mut self, events: &[CalendarEvent], now: DateTime<Utc>) -> Result<usize> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Custom(format!("reminders need a tokio runtime: {e}")))?;
        self.cancel_all();

        for reminder in plan_reminders(events, now, self.lead) {
            let delay = (reminder.fire_at - now).to_std().unwrap_or_default();
            let notifier = Arc::clone(&self.notifier);
            let fired = reminder.clone();
            let task = handle.spawn(async move {
                tokio::time::sleep(delay).await;
                tracing::info!(event_id = %fired.event_id, title = %fired.title, "reminder fired");
                notifier.notify(&fired);
            });
            self.armed.push((reminder, task));
        }

        tracing::debug!(count = self.armed.len(), "reminders armed");
        Ok(self.armed.len())
    }

    pub fn cancel_all(&mut self) {
        for (_, task) in self.armed.drain(..) {
            task.abort();
        }
    }

    /// Reminders that have not fired yet.
    pub fn pending(&self) -> Vec<&Reminder> {
        self.armed
            .iter()
            .filter(|(_, task)| !task.is_finished())
            .map(|(reminder, _)| reminder)
            .collect()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        fired: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, reminder: &Reminder) {
            self.fired
                .lock()
                .unwrap()
                .push(reminder.notification_title());
        }
    }

    impl Recorder {
        fn fired(&self) -> Vec<String> {
            self.fired.lock().unwrap().clone()
        }
    }

    fn event(id: &str, start: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent {
            id: id.into(),
            owner_id: "u1".into(),
            title: format!("Task {id}"),
            subject: "Math".into(),
            start,
            end: start + Duration::hours(1),
            completed: false,
        }
    }

    #[test]
    fn plan_skips_events_inside_lead_time() {
        let now = Utc::now();
        let events = vec![
            event("past", now - Duration::hours(1)),
            event("soon", now + Duration::minutes(3)),
            event("edge", now + Duration::minutes(5)),
            event("later", now + Duration::minutes(30)),
            event("next", now + Duration::minutes(10)),
        ];
        let plan = plan_reminders(&events, now, default_lead());
        let ids: Vec<_> = plan.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["next", "later"]);
        assert_eq!(plan[0].fire_at, now + Duration::minutes(5));
        assert_eq!(plan[0].notification_title(), "Reminder: Task next");
        assert_eq!(plan[0].notification_body(), "Subject: Math");
    }

    #[test]
    fn rearm_outside_runtime_is_an_error() {
        let mut scheduler = ReminderScheduler::new(Arc::new(Recorder::default()), default_lead());
        let now = Utc::now();
        assert!(scheduler
            .rearm(&[event("a", now + Duration::hours(1))], now)
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reminders_fire_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = ReminderScheduler::new(recorder.clone(), default_lead());
        let now = Utc::now();
        let armed = scheduler
            .rearm(&[event("a", now + Duration::minutes(10))], now)
            .unwrap();
        assert_eq!(armed, 1);

        tokio::time::sleep(std::time::Duration::from_secs(4 * 60)).await;
        assert!(recorder.fired().is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(2 * 60)).await;
        assert_eq!(recorder.fired(), vec!["Reminder: Task a".to_string()]);
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_previous_timers() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = ReminderScheduler::new(recorder.clone(), default_lead());
        let now = Utc::now();
        let events = vec![event("a", now + Duration::minutes(10))];
        scheduler.rearm(&events, now).unwrap();
        scheduler.rearm(&events, now).unwrap();
        assert_eq!(scheduler.pending().len(), 1);

        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
        assert_eq!(recorder.fired().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_silences_pending_reminders() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = ReminderScheduler::new(recorder.clone(), default_lead());
        let now = Utc::now();
        scheduler
            .rearm(&[event("a", now + Duration::minutes(10))], now)
            .unwrap();
        scheduler.cancel_all();

        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
        assert!(recorder.fired().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_cancels_timers() {
        let recorder = Arc::new(Recorder::default());
        let now = Utc::now();
        {
            let mut scheduler = ReminderScheduler::new(recorder.clone(), default_lead());
            scheduler
                .rearm(&[event("a", now + Duration::minutes(10))], now)
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
        assert!(recorder.fired().is_empty());
    }
}
