//! Document store contract.
//!
//! Every piece of synchronized state (profiles, attendance, calendar events)
//! lives in a schemaless document store addressed by `(collection, id)`.
//! Adapters receive the store explicitly as `&dyn DocumentStore`; there is no
//! global handle.
//!
//! Backends:
//! - [`crate::storage::Database`]: SQLite, the default local backend
//! - [`MemoryStore`]: in-process map, used by tests

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Remote document database as seen by the adapters.
///
/// No method offers transactional guarantees: concurrent writers race and
/// the last write wins.
pub trait DocumentStore {
    /// Fetch a document, `None` if it does not exist.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document.
    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Create a document or deep-merge `fields` into the existing one.
    fn set_merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Replace a single top-level field of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is missing.
    fn update(&self, collection: &str, id: &str, field: &str, value: Value)
        -> Result<(), StoreError>;

    /// Create a document with a store-assigned id and return that id.
    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Delete a document. Deleting a missing document is not an error.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// All documents whose top-level `field` equals `value`, ordered by id.
    fn query_eq(&self, collection: &str, field: &str, value: &Value)
        -> Result<Vec<Document>, StoreError>;
}

/// Merge `patch` into `target`.
///
/// Nested objects merge key by key; any other value (arrays included)
/// replaces what was there.
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_fields(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

/// Generate a fresh document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Serialize a value that must be a JSON object into [`Fields`].
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "document must serialize to a JSON object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_combines_nested_objects() {
        let mut target = fields(json!({"math": {"2024-01-01": "present"}, "other": 1}));
        merge_fields(
            &mut target,
            fields(json!({"math": {"2024-01-02": "absent"}})),
        );
        assert_eq!(
            Value::Object(target),
            json!({"math": {"2024-01-01": "present", "2024-01-02": "absent"}, "other": 1})
        );
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let mut target = fields(json!({"subjects": ["a", "b"], "gpa": "8.00"}));
        merge_fields(&mut target, fields(json!({"subjects": ["c"]})));
        assert_eq!(target["subjects"], json!(["c"]));
        assert_eq!(target["gpa"], json!("8.00"));
    }

    #[test]
    fn merge_replaces_scalar_with_object() {
        let mut target = fields(json!({"gpa": null}));
        merge_fields(&mut target, fields(json!({"gpa": {"value": 9}})));
        assert_eq!(target["gpa"], json!({"value": 9}));
    }

    #[test]
    fn document_ids_are_unique() {
        assert_ne!(new_document_id(), new_document_id());
    }
}
