use clap::Subcommand;
use studyroom_core::{LocalPrefs, Theme};

use super::{CmdResult, Session};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show or set the theme (light/dark)
    Theme { value: Option<Theme> },
    /// Show or replace the scratchpad note
    Note { text: Option<String> },
    /// Local to-do list
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },
}

#[derive(Subcommand)]
pub enum TodoAction {
    /// Append an item
    Add { text: String },
    /// Mark an item done (1-based)
    Done { index: usize },
    /// Remove an item (1-based)
    Remove { index: usize },
    /// Show the list
    List,
}

fn print_tasks(prefs: &LocalPrefs) -> CmdResult {
    for (i, task) in prefs.tasks()?.iter().enumerate() {
        let mark = if task.done { "x" } else { " " };
        println!("{}. [{mark}] {}", i + 1, task.text);
    }
    Ok(())
}

pub fn run(action: PrefsAction) -> CmdResult {
    let session = Session::open()?;
    let prefs = LocalPrefs::new(&session.db);

    match action {
        PrefsAction::Theme { value: Some(theme) } => {
            prefs.set_theme(theme)?;
            println!("{}", serde_json::to_string(&theme)?.trim_matches('"'));
        }
        PrefsAction::Theme { value: None } => {
            println!("{}", serde_json::to_string(&prefs.theme()?)?.trim_matches('"'));
        }
        PrefsAction::Note { text: Some(text) } => {
            prefs.set_scratchpad(&text)?;
            println!("ok");
        }
        PrefsAction::Note { text: None } => println!("{}", prefs.scratchpad()?),
        PrefsAction::Todo { action } => {
            match action {
                TodoAction::Add { text } => {
                    prefs.add_task(&text)?;
                }
                TodoAction::Done { index } => {
                    if !prefs.complete_task(index.wrapping_sub(1))? {
                        return Err(format!("no to-do item {index}").into());
                    }
                }
                TodoAction::Remove { index } => {
                    if !prefs.remove_task(index.wrapping_sub(1))? {
                        return Err(format!("no to-do item {index}").into());
                    }
                }
                TodoAction::List => {}
            }
            print_tasks(&prefs)?;
        }
    }
    Ok(())
}
