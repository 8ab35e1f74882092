//! Calendar events.
//!
//! Events live in the `events` collection, one document per event, tagged
//! with the owner's id. [`EventBoard`] is the working copy a front end holds:
//! every write goes to the store and is followed by a full reload, so the
//! board always mirrors what the store returned last.

pub mod reminder;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ValidationError};
use crate::metrics::{self, EngagementLevel};
use crate::store::{to_fields, Document, DocumentStore, Fields};

pub const EVENTS_COLLECTION: &str = "events";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub completed: bool,
}

/// Stored shape of an event. Instants are RFC 3339 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDoc {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub subject: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub completed: bool,
}

impl EventDoc {
    fn into_event(self, id: String) -> std::result::Result<CalendarEvent, String> {
        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("bad timestamp '{s}': {e}"))
        };
        Ok(CalendarEvent {
            start: parse(&self.start)?,
            end: parse(&self.end)?,
            id,
            owner_id: self.user_id,
            title: self.title,
            subject: self.subject,
            completed: self.completed,
        })
    }
}

/// Input for [`EventBoard::add`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(ValidationError::InvalidTimeRange { start, end }.into());
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must not be empty".into(),
        }
        .into());
    }
    Ok(())
}

fn decode_event(doc: Document) -> Option<CalendarEvent> {
    let id = doc.id;
    let parsed = serde_json::from_value::<EventDoc>(Value::Object(doc.fields))
        .map_err(|e| e.to_string())
        .and_then(|dto| dto.into_event(id.clone()));
    match parsed {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "skipping malformed event");
            None
        }
    }
}

/// Fetch every event of `owner`, ordered by start time.
pub fn list(store: &dyn DocumentStore, owner: &str) -> Result<Vec<CalendarEvent>> {
    let docs = store.query_eq(EVENTS_COLLECTION, "userId", &json!(owner))?;
    let mut events: Vec<CalendarEvent> = docs.into_iter().filter_map(decode_event).collect();
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    Ok(events)
}

pub struct EventBoard<'a> {
    store: &'a dyn DocumentStore,
    owner: String,
    events: Vec<CalendarEvent>,
    subject_filter: Option<String>,
}

impl<'a> EventBoard<'a> {
    pub fn load(store: &'a dyn DocumentStore, owner: &str) -> Result<Self> {
        let events = list(store, owner)?;
        Ok(Self {
            store,
            owner: owner.to_string(),
            events,
            subject_filter: None,
        })
    }

    pub fn reload(&mut self) -> Result<()> {
        self.events = list(self.store, &self.owner)?;
        Ok(())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Every event of the owner.
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn set_subject_filter(&mut self, subject: Option<String>) {
        self.subject_filter = subject;
    }

    pub fn subject_filter(&self) -> Option<&str> {
        self.subject_filter.as_deref()
    }

    /// Events passing the subject filter.
    pub fn visible(&self) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|e| match &self.subject_filter {
                Some(subject) => &e.subject == subject,
                None => true,
            })
            .collect()
    }

    pub fn completed(&self) -> Vec<&CalendarEvent> {
        self.events.iter().filter(|e| e.completed).collect()
    }

    pub fn engagement_level(&self) -> EngagementLevel {
        metrics::engagement_level(self.visible().len())
    }

    /// Create a not-yet-completed event and return its store id.
    pub fn add(&mut self, new: NewEvent) -> Result<String> {
        require_text("title", &new.title)?;
        require_text("subject", &new.subject)?;
        check_range(new.start, new.end)?;

        let doc = EventDoc {
            user_id: self.owner.clone(),
            title: new.title.trim().to_string(),
            subject: new.subject.trim().to_string(),
            start: new.start.to_rfc3339(),
            end: new.end.to_rfc3339(),
            completed: false,
        };
        let id = self.store.add(EVENTS_COLLECTION, to_fields(&doc)?)?;
        tracing::info!(id = %id, title = %doc.title, "event added");
        self.reload()?;
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.require(id)?;
        self.store.delete(EVENTS_COLLECTION, id)?;
        tracing::info!(id, "event deleted");
        self.reload()
    }

    /// Move or resize: only start and end change, in a single write so the
    /// stored range is never half-updated.
    pub fn reschedule(&mut self, id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
        self.require(id)?;
        check_range(start, end)?;
        let mut times = Fields::new();
        times.insert("start".into(), json!(start.to_rfc3339()));
        times.insert("end".into(), json!(end.to_rfc3339()));
        self.store.set_merge(EVENTS_COLLECTION, id, times)?;
        tracing::info!(id, %start, %end, "event rescheduled");
        self.reload()
    }

    /// Mark an event done. Completion is one-way; returns `false` when the
    /// event was already complete.
    pub fn complete(&mut self, id: &str) -> Result<bool> {
        if self.require(id)?.completed {
            return Ok(false);
        }
        self.store
            .update(EVENTS_COLLECTION, id, "completed", json!(true))?;
        tracing::info!(id, "event completed");
        self.reload()?;
        Ok(true)
    }

    fn require(&self, id: &str) -> Result<&CalendarEvent> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownEvent(id.to_string()).into())
    }
}
