use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use studyroom_core::planner::reminder::plan_reminders;
use studyroom_core::{CalendarEvent, EventBoard, NewEvent, Notifier, Reminder, ReminderScheduler};

use super::{parse_datetime, print_json, CmdResult, Session};

const WATCH_RELOAD_SECS: u64 = 60;

#[derive(Subcommand)]
pub enum EventAction {
    /// Create an event
    Add {
        title: String,
        #[arg(long)]
        subject: String,
        /// Start (RFC 3339 or "YYYY-MM-DD HH:MM" local)
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        /// End (RFC 3339 or "YYYY-MM-DD HH:MM" local)
        #[arg(long, value_parser = parse_datetime)]
        end: DateTime<Utc>,
    },
    /// List events ordered by start time
    List {
        /// Only show events of this subject
        #[arg(long)]
        subject: Option<String>,
    },
    /// Move or resize an event
    Move {
        id: String,
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_datetime)]
        end: DateTime<Utc>,
    },
    /// Mark an event complete
    Done { id: String },
    /// Delete an event
    Delete { id: String },
    /// List completed events
    Completed,
    /// Show the reminders that would be armed right now
    Reminders,
    /// Stay running and deliver reminders until interrupted
    Watch,
}

/// Prints fired reminders to stdout.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, reminder: &Reminder) {
        println!("{}", reminder.notification_title());
        println!("{}", reminder.notification_body());
        if let Ok(json) = serde_json::to_string(&reminder.to_event()) {
            println!("{json}");
        }
    }
}

fn print_events<'e>(events: impl IntoIterator<Item = &'e CalendarEvent>) {
    let mut empty = true;
    for e in events {
        empty = false;
        let mark = if e.completed { "x" } else { " " };
        println!(
            "[{mark}] {}  {} - {}  {} ({})",
            e.id,
            e.start.format("%Y-%m-%d %H:%M"),
            e.end.format("%H:%M"),
            e.title,
            e.subject
        );
    }
    if empty {
        println!("No events.");
    }
}

pub fn run(action: EventAction) -> CmdResult {
    let session = Session::open()?;
    let lead = session.config.reminder_lead();
    let mut board = EventBoard::load(&session.db, session.owner())?;

    match action {
        EventAction::Add {
            title,
            subject,
            start,
            end,
        } => {
            let id = board.add(NewEvent {
                title,
                subject,
                start,
                end,
            })?;
            println!("Event created: {id}");
        }
        EventAction::List { subject } => {
            board.set_subject_filter(subject);
            print_events(board.visible());
            println!("Level: {}", board.engagement_level());
        }
        EventAction::Move { id, start, end } => {
            board.reschedule(&id, start, end)?;
            println!("Event moved: {id}");
        }
        EventAction::Done { id } => {
            if board.complete(&id)? {
                println!("Event completed: {id}");
            } else {
                println!("Event already completed: {id}");
            }
        }
        EventAction::Delete { id } => {
            board.remove(&id)?;
            println!("Event deleted: {id}");
        }
        EventAction::Completed => print_events(board.completed()),
        EventAction::Reminders => {
            let plan = plan_reminders(board.events(), Utc::now(), lead);
            print_json(&json!({ "leadMinutes": lead.num_minutes(), "reminders": plan }))?;
        }
        EventAction::Watch => {
            if !session.config.reminders.enabled {
                return Err("reminders are disabled (reminders.enabled = false)".into());
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(&mut board, lead))?;
        }
    }
    Ok(())
}

/// Arm reminders for the current events and re-arm whenever the stored
/// list changes, until Ctrl-C.
async fn watch(board: &mut EventBoard<'_>, lead: chrono::Duration) -> CmdResult {
    let mut scheduler = ReminderScheduler::new(Arc::new(StdoutNotifier), lead);
    let armed = scheduler.rearm(board.events(), Utc::now())?;
    eprintln!("Watching {} event(s), {armed} reminder(s) armed. Ctrl-C to stop.", board.events().len());

    let mut reload = tokio::time::interval(StdDuration::from_secs(WATCH_RELOAD_SECS));
    reload.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = reload.tick() => {
                let before = board.events().to_vec();
                if let Err(e) = board.reload() {
                    tracing::warn!(error = %e, "event reload failed");
                    continue;
                }
                if board.events() != before.as_slice() {
                    let armed = scheduler.rearm(board.events(), Utc::now())?;
                    tracing::info!(armed, "event list changed; reminders re-armed");
                }
            }
        }
    }

    scheduler.cancel_all();
    Ok(())
}
