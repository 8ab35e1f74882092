use clap::Subcommand;
use serde_json::json;
use studyroom_core::{AcademicRecord, GradeBook, ProfileStore, SubjectField};

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum GpaAction {
    /// Print every semester with its SGPA, plus the CGPA
    Show,
    /// Append a semester with one blank subject
    AddSemester,
    /// Remove a semester (1-based)
    RemoveSemester { semester: usize },
    /// Append a blank subject to a semester (1-based)
    AddSubject { semester: usize },
    /// Remove a subject (1-based positions)
    RemoveSubject { semester: usize, subject: usize },
    /// Edit a subject field: name, marks or credits
    Set {
        semester: usize,
        subject: usize,
        field: SubjectField,
        value: String,
    },
    /// Back to a single blank semester
    Reset,
}

fn position(n: usize, what: &str) -> Result<usize, String> {
    n.checked_sub(1)
        .ok_or_else(|| format!("{what} positions start at 1"))
}

fn report(record: &AcademicRecord) -> serde_json::Value {
    let semesters: Vec<_> = record
        .semesters
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "semester": i + 1,
                "subjects": s.subjects,
                "sgpa": s.sgpa(),
                "credits": s.total_credits(),
            })
        })
        .collect();
    json!({ "semesters": semesters, "cgpa": record.cgpa() })
}

pub fn run(action: GpaAction) -> CmdResult {
    let session = Session::open()?;
    // The GPA record merges into the profile document; make sure it exists.
    ProfileStore::load(&session.db, session.owner())?;
    let book = GradeBook::new(&session.db, session.owner());
    let mut record = book.load()?;
    let edits = !matches!(action, GpaAction::Show);

    match action {
        GpaAction::Show => {}
        GpaAction::AddSemester => record.add_semester(),
        GpaAction::RemoveSemester { semester } => {
            record.remove_semester(position(semester, "semester")?)?;
        }
        GpaAction::AddSubject { semester } => {
            record.add_subject(position(semester, "semester")?)?;
        }
        GpaAction::RemoveSubject { semester, subject } => {
            record.remove_subject(
                position(semester, "semester")?,
                position(subject, "subject")?,
            )?;
        }
        GpaAction::Set {
            semester,
            subject,
            field,
            value,
        } => {
            record.set_field(
                position(semester, "semester")?,
                position(subject, "subject")?,
                field,
                &value,
            )?;
        }
        GpaAction::Reset => record.reset(),
    }

    if edits {
        book.save(&record)?;
    }
    print_json(&report(&record))
}
