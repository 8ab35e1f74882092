use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::{merge_fields, new_document_id, Document, DocumentStore, Fields};
use crate::error::StoreError;

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// In-memory [`DocumentStore`].
///
/// Writes can be switched off with [`MemoryStore::fail_writes`] to exercise
/// the error paths of the adapters; `update` can be switched off on its own
/// with [`MemoryStore::fail_updates`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    fail_writes: AtomicBool,
    fail_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        // A poisoned map is still structurally valid.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("memory store is read-only".into()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check_writable()?;
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    fn set_merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut guard = self.lock();
        let existing = guard
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        merge_fields(existing, fields);
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("update disabled".into()));
        }
        let mut guard = self.lock();
        let doc = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.insert(field.to_string(), value);
        Ok(())
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check_writable()?;
        let id = new_document_id();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some(docs) = self.lock().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| fields.get(field) == Some(value))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn update_requires_existing_document() {
        let store = MemoryStore::new();
        let err = store
            .update("users", "u1", "gpa", json!("9.00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        store.set("users", "u1", obj(json!({"gpa": null}))).unwrap();
        store.update("users", "u1", "gpa", json!("9.00")).unwrap();
        let doc = store.get("users", "u1").unwrap().unwrap();
        assert_eq!(doc.field("gpa"), Some(&json!("9.00")));
    }

    #[test]
    fn query_filters_on_field() {
        let store = MemoryStore::new();
        store.add("events", obj(json!({"userId": "a"}))).unwrap();
        store.add("events", obj(json!({"userId": "b"}))).unwrap();
        store.add("events", obj(json!({"userId": "a"}))).unwrap();
        let found = store.query_eq("events", "userId", &json!("a")).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(store.len("events"), 3);
    }

    #[test]
    fn failed_writes_leave_data_untouched() {
        let store = MemoryStore::new();
        store.set("users", "u1", obj(json!({"x": 1}))).unwrap();
        store.fail_writes(true);
        assert!(store.set("users", "u1", obj(json!({"x": 2}))).is_err());
        assert!(store.delete("users", "u1").is_err());
        store.fail_writes(false);
        let doc = store.get("users", "u1").unwrap().unwrap();
        assert_eq!(doc.field("x"), Some(&json!(1)));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.delete("events", "missing").unwrap();
    }
}
