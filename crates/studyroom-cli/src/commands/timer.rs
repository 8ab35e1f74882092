use chrono::Utc;
use clap::Subcommand;
use studyroom_core::{Event, LocalPrefs, TimerDurations, TimerEngine};

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if paused, pause if running
    Toggle,
    /// Back to a full focus session
    Reset,
    /// Jump to the other phase
    Switch,
    /// Print current timer state as JSON
    Status,
    /// Set the focus length in minutes (1-90)
    Focus { minutes: String },
    /// Set the break length in minutes (1-30)
    Break { minutes: String },
    /// Turn auto-continue between phases on or off
    Auto {
        #[arg(value_parser = ["on", "off"])]
        mode: String,
    },
}

/// Rebuild the engine from the saved slot, reporting a session that ran
/// out while nobody was watching.
fn load_engine(prefs: &LocalPrefs, durations: TimerDurations) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let auto_continue = prefs.auto_mode()?;
    let engine = match prefs.timer_state()? {
        Some(saved) => {
            let (engine, expired) = TimerEngine::restore(&saved, durations, auto_continue, Utc::now());
            if let Some(event) = expired {
                print_json(&event)?;
            }
            engine
        }
        None => TimerEngine::new(durations).with_auto_continue(auto_continue),
    };
    Ok(engine)
}

fn parse_minutes(input: &str) -> Result<u32, String> {
    TimerDurations::parse_minutes(input)
        .ok_or_else(|| format!("invalid minutes '{input}' (expected a positive whole number)"))
}

pub fn run(action: TimerAction) -> CmdResult {
    let mut session = Session::open()?;
    let durations = session.config.timer_durations();
    let prefs = LocalPrefs::new(&session.db);
    let mut engine = load_engine(&prefs, durations)?;

    let event: Option<Event> = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Toggle => engine.toggle(),
        TimerAction::Reset => engine.reset(),
        TimerAction::Switch => engine.switch_phase(),
        TimerAction::Status => None,
        TimerAction::Focus { minutes } => {
            let event = engine.set_focus_minutes(parse_minutes(&minutes)?);
            session.config.timer.focus_minutes = engine.durations().focus_minutes();
            session.config.save()?;
            event
        }
        TimerAction::Break { minutes } => {
            let event = engine.set_break_minutes(parse_minutes(&minutes)?);
            session.config.timer.break_minutes = engine.durations().break_minutes();
            session.config.save()?;
            event
        }
        TimerAction::Auto { mode } => {
            let enabled = mode == "on";
            engine.set_auto_continue(enabled);
            prefs.set_auto_mode(enabled)?;
            None
        }
    };

    match event {
        Some(event) => print_json(&event)?,
        None => print_json(&engine.snapshot())?,
    }

    prefs.save_timer_state(&engine.persist(Utc::now()))?;
    Ok(())
}
