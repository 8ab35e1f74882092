//! GPA calculator model.
//!
//! An [`AcademicRecord`] is an ordered list of semesters, each an ordered
//! list of subjects. Marks and credits keep the raw text the user entered;
//! anything that is not a number is carried along but left out of the
//! SGPA/CGPA sums (see [`crate::metrics`]).
//!
//! The whole record is written back on every edit, under the `semesters`
//! field of the owner's profile document, alongside the computed CGPA.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ValidationError};
use crate::metrics;
use crate::profile::USERS_COLLECTION;
use crate::store::{DocumentStore, Fields};

pub const MAX_MARKS: f64 = 100.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub marks: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub credits: String,
}

impl SubjectEntry {
    /// Marks as a number within 0-100. Text and out-of-range numbers
    /// (possible in stored records) yield `None`.
    pub fn marks_value(&self) -> Option<f64> {
        parse_number(&self.marks).filter(|n| (0.0..=MAX_MARKS).contains(n))
    }

    /// Credits as a non-negative number, `None` otherwise.
    pub fn credits_value(&self) -> Option<f64> {
        parse_number(&self.credits).filter(|n| *n >= 0.0)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Older documents stored numbers instead of strings.
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
}

impl Default for Semester {
    fn default() -> Self {
        Self {
            subjects: vec![SubjectEntry::default()],
        }
    }
}

impl Semester {
    pub fn sgpa(&self) -> String {
        metrics::sgpa(&self.subjects)
    }

    pub fn total_credits(&self) -> f64 {
        metrics::total_credits(&self.subjects)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
    Name,
    Marks,
    Credits,
}

impl std::str::FromStr for SubjectField {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name" => Ok(SubjectField::Name),
            "marks" => Ok(SubjectField::Marks),
            "credits" => Ok(SubjectField::Credits),
            other => Err(ValidationError::InvalidValue {
                field: "field".into(),
                message: format!("expected name, marks or credits, got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub semesters: Vec<Semester>,
}

impl Default for AcademicRecord {
    fn default() -> Self {
        Self {
            semesters: vec![Semester::default()],
        }
    }
}

impl AcademicRecord {
    pub fn cgpa(&self) -> String {
        metrics::cgpa(&self.semesters)
    }

    pub fn add_semester(&mut self) {
        self.semesters.push(Semester::default());
    }

    pub fn remove_semester(&mut self, index: usize) -> Result<Semester> {
        self.check_semester(index)?;
        Ok(self.semesters.remove(index))
    }

    pub fn add_subject(&mut self, semester: usize) -> Result<()> {
        self.check_semester(semester)?;
        self.semesters[semester].subjects.push(SubjectEntry::default());
        Ok(())
    }

    pub fn remove_subject(&mut self, semester: usize, subject: usize) -> Result<SubjectEntry> {
        self.check_subject(semester, subject)?;
        Ok(self.semesters[semester].subjects.remove(subject))
    }

    /// Edit one field of one subject.
    ///
    /// Numeric marks must be within 0-100 and numeric credits must not be
    /// negative; such edits are rejected and the record is left unchanged.
    /// Non-numeric text is stored as typed.
    pub fn set_field(
        &mut self,
        semester: usize,
        subject: usize,
        field: SubjectField,
        value: &str,
    ) -> Result<()> {
        self.check_subject(semester, subject)?;
        match field {
            SubjectField::Marks => {
                if let Some(n) = parse_number(value) {
                    if !(0.0..=MAX_MARKS).contains(&n) {
                        return Err(ValidationError::InvalidValue {
                            field: "marks".into(),
                            message: format!("{n} is outside 0-100"),
                        }
                        .into());
                    }
                }
            }
            SubjectField::Credits => {
                if let Some(n) = parse_number(value) {
                    if n < 0.0 {
                        return Err(ValidationError::InvalidValue {
                            field: "credits".into(),
                            message: format!("{n} is negative"),
                        }
                        .into());
                    }
                }
            }
            SubjectField::Name => {}
        }

        let entry = &mut self.semesters[semester].subjects[subject];
        let slot = match field {
            SubjectField::Name => &mut entry.name,
            SubjectField::Marks => &mut entry.marks,
            SubjectField::Credits => &mut entry.credits,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// Back to a single blank semester.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn check_semester(&self, index: usize) -> Result<()> {
        if index >= self.semesters.len() {
            return Err(ValidationError::OutOfBounds {
                collection: "semesters".into(),
                index,
                len: self.semesters.len(),
            }
            .into());
        }
        Ok(())
    }

    fn check_subject(&self, semester: usize, subject: usize) -> Result<()> {
        self.check_semester(semester)?;
        let len = self.semesters[semester].subjects.len();
        if subject >= len {
            return Err(ValidationError::OutOfBounds {
                collection: format!("semester {} subjects", semester + 1),
                index: subject,
                len,
            }
            .into());
        }
        Ok(())
    }
}

/// Loads and saves an owner's [`AcademicRecord`].
pub struct GradeBook<'a> {
    store: &'a dyn DocumentStore,
    owner: String,
}

impl<'a> GradeBook<'a> {
    pub fn new(store: &'a dyn DocumentStore, owner: &str) -> Self {
        Self {
            store,
            owner: owner.to_string(),
        }
    }

    /// The stored record, or the default one when nothing usable is stored.
    pub fn load(&self) -> Result<AcademicRecord> {
        let Some(doc) = self.store.get(USERS_COLLECTION, &self.owner)? else {
            return Ok(AcademicRecord::default());
        };
        let Some(value) = doc.field("semesters") else {
            return Ok(AcademicRecord::default());
        };
        match serde_json::from_value::<Vec<Semester>>(value.clone()) {
            Ok(semesters) => Ok(AcademicRecord { semesters }),
            Err(e) => {
                tracing::warn!(error = %e, owner = %self.owner, "stored semesters are malformed; using a blank record");
                Ok(AcademicRecord::default())
            }
        }
    }

    /// Replace the stored record and refresh the profile's `gpa` field.
    pub fn save(&self, record: &AcademicRecord) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("semesters".into(), serde_json::to_value(&record.semesters)?);
        fields.insert("gpa".into(), json!(record.cgpa()));
        self.store.set_merge(USERS_COLLECTION, &self.owner, fields)?;
        tracing::debug!(owner = %self.owner, semesters = record.semesters.len(), "academic record saved");
        Ok(())
    }
}
