use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::json;
use studyroom_core::metrics;
use studyroom_core::AttendanceTracker;

use super::{parse_date, print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum AttendanceAction {
    /// Flip a date between present and absent (unmarked becomes present)
    Toggle {
        subject: String,
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Summary and chart series for a subject
    Show { subject: String },
    /// Subjects that have attendance records
    List,
}

pub fn run(action: AttendanceAction) -> CmdResult {
    let session = Session::open()?;
    let owner = session.owner();

    match action {
        AttendanceAction::Toggle { subject, date } => {
            let mut tracker = AttendanceTracker::load(&session.db, owner, &subject)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let event = tracker.toggle_event(date)?;
            print_json(&event)?;
        }
        AttendanceAction::Show { subject } => {
            let tracker = AttendanceTracker::load(&session.db, owner, &subject)?;
            let records = tracker.records();
            print_json(&json!({
                "subject": tracker.subject(),
                "summary": tracker.summary(),
                "bar": metrics::bar_series(records),
                "line": metrics::line_series(records),
            }))?;
        }
        AttendanceAction::List => {
            let subjects = AttendanceTracker::subjects_with_records(&session.db, owner)?;
            if subjects.is_empty() {
                println!("No attendance recorded yet.");
            }
            for subject in subjects {
                println!("{subject}");
            }
        }
    }
    Ok(())
}
