//! The per-user profile document: tracked subjects and the last GPA.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::store::{to_fields, DocumentStore};

pub const USERS_COLLECTION: &str = "users";

/// Typed view of `users/{owner}`.
///
/// `events` is a legacy list that predates the `events` collection; it is
/// created empty for new profiles and otherwise left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDoc {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub gpa: Option<String>,
}

pub struct ProfileStore<'a> {
    store: &'a dyn DocumentStore,
    owner: String,
    profile: ProfileDoc,
}

impl<'a> ProfileStore<'a> {
    /// Fetch the profile, creating an empty one on first use.
    pub fn load(store: &'a dyn DocumentStore, owner: &str) -> Result<Self> {
        let profile = match store.get(USERS_COLLECTION, owner)? {
            Some(doc) => {
                let value = Value::Object(doc.fields);
                match ProfileDoc::deserialize(&value) {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(error = %e, owner, "profile document is malformed; using defaults");
                        ProfileDoc::default()
                    }
                }
            }
            None => {
                let profile = ProfileDoc::default();
                store.set(USERS_COLLECTION, owner, to_fields(&profile)?)?;
                tracing::info!(owner, "created profile document");
                profile
            }
        };

        Ok(Self {
            store,
            owner: owner.to_string(),
            profile,
        })
    }

    pub fn subjects(&self) -> &[String] {
        &self.profile.subjects
    }

    pub fn gpa(&self) -> Option<&str> {
        self.profile.gpa.as_deref()
    }

    /// Add a subject. Blank names and duplicates are ignored (`false`).
    pub fn add_subject(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.profile.subjects.iter().any(|s| s == name) {
            return Ok(false);
        }
        self.profile.subjects.push(name.to_string());
        self.write_subjects()?;
        Ok(true)
    }

    /// Remove a subject. Returns `false` if it was not tracked.
    pub fn remove_subject(&mut self, name: &str) -> Result<bool> {
        let before = self.profile.subjects.len();
        self.profile.subjects.retain(|s| s != name);
        if self.profile.subjects.len() == before {
            return Ok(false);
        }
        self.write_subjects()?;
        Ok(true)
    }

    fn write_subjects(&self) -> Result<()> {
        self.store.update(
            USERS_COLLECTION,
            &self.owner,
            "subjects",
            json!(self.profile.subjects),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fields, MemoryStore};

    #[test]
    fn load_creates_empty_profile() {
        let store = MemoryStore::new();
        let profile = ProfileStore::load(&store, "u1").unwrap();
        assert!(profile.subjects().is_empty());
        assert!(profile.gpa().is_none());

        let doc = store.get(USERS_COLLECTION, "u1").unwrap().unwrap();
        assert_eq!(doc.field("subjects"), Some(&json!([])));
        assert_eq!(doc.field("events"), Some(&json!([])));
        assert_eq!(doc.field("gpa"), Some(&Value::Null));
    }

    #[test]
    fn subjects_are_trimmed_and_unique() {
        let store = MemoryStore::new();
        let mut profile = ProfileStore::load(&store, "u1").unwrap();
        assert!(profile.add_subject("  Physics ").unwrap());
        assert!(!profile.add_subject("Physics").unwrap());
        assert!(!profile.add_subject("   ").unwrap());
        assert!(profile.add_subject("Chemistry").unwrap());

        let reloaded = ProfileStore::load(&store, "u1").unwrap();
        assert_eq!(reloaded.subjects(), ["Physics", "Chemistry"]);
    }

    #[test]
    fn remove_subject_reports_absence() {
        let store = MemoryStore::new();
        let mut profile = ProfileStore::load(&store, "u1").unwrap();
        profile.add_subject("Physics").unwrap();
        assert!(profile.remove_subject("Physics").unwrap());
        assert!(!profile.remove_subject("Physics").unwrap());
        assert!(ProfileStore::load(&store, "u1").unwrap().subjects().is_empty());
    }

    #[test]
    fn gpa_reads_what_the_grade_book_stored() {
        let store = MemoryStore::new();
        ProfileStore::load(&store, "u1").unwrap();
        let mut patch = Fields::new();
        patch.insert("gpa".into(), json!("8.50"));
        store.set_merge(USERS_COLLECTION, "u1", patch).unwrap();
        assert_eq!(ProfileStore::load(&store, "u1").unwrap().gpa(), Some("8.50"));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let store = MemoryStore::new();
        store
            .set(
                USERS_COLLECTION,
                "u1",
                to_fields(&json!({"subjects": ["Art"], "semesters": []})).unwrap(),
            )
            .unwrap();
        let profile = ProfileStore::load(&store, "u1").unwrap();
        assert_eq!(profile.subjects(), ["Art"]);
    }
}
