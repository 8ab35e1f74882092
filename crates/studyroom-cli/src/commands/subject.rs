use clap::Subcommand;
use studyroom_core::ProfileStore;

use super::{CmdResult, Session};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Track a subject
    Add { name: String },
    /// Stop tracking a subject
    Remove { name: String },
    /// List tracked subjects
    List,
}

pub fn run(action: SubjectAction) -> CmdResult {
    let session = Session::open()?;
    let mut profile = ProfileStore::load(&session.db, session.owner())?;

    match action {
        SubjectAction::Add { name } => {
            if profile.add_subject(&name)? {
                println!("Subject added: {}", name.trim());
            } else {
                println!("Subject already tracked or blank: {name}");
            }
        }
        SubjectAction::Remove { name } => {
            if profile.remove_subject(&name)? {
                println!("Subject removed: {name}");
            } else {
                return Err(format!("subject not tracked: {name}").into());
            }
        }
        SubjectAction::List => {
            for subject in profile.subjects() {
                println!("{subject}");
            }
        }
    }
    Ok(())
}
