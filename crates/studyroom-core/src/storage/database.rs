//! SQLite-backed document store.
//!
//! Provides persistent storage for:
//! - Documents of every collection (profiles, attendance, events)
//! - Key-value slots for local state (see [`super::prefs`])

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::data_dir;
use crate::error::{CoreError, StoreError};
use crate::store::{merge_fields, new_document_id, Document, DocumentStore, Fields};

/// SQLite database holding the document collections and the kv slots.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studyroom.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                body       TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn read_body(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| decode_body(collection, id, &b)).transpose()
    }

    fn write_body(&self, collection: &str, id: &str, fields: &Fields) -> Result<(), StoreError> {
        let body = serde_json::to_string(fields).map_err(|e| StoreError::Malformed {
            collection: collection.to_string(),
            id: id.to_string(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, id, body, chrono::Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(collection, id, "document written");
        Ok(())
    }
}

fn decode_body(collection: &str, id: &str, body: &str) -> Result<Fields, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Malformed {
        collection: collection.to_string(),
        id: id.to_string(),
        message: e.to_string(),
    })
}

impl DocumentStore for Database {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .read_body(collection, id)?
            .map(|fields| Document::new(id, fields)))
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.write_body(collection, id, &fields)
    }

    fn set_merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut current = self.read_body(collection, id)?.unwrap_or_default();
        merge_fields(&mut current, fields);
        self.write_body(collection, id, &current)
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut current =
            self.read_body(collection, id)?
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
        current.insert(field.to_string(), value);
        self.write_body(collection, id, &current)
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = new_document_id();
        self.write_body(collection, &id, &fields)?;
        Ok(id)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        tracing::debug!(collection, id, "document deleted");
        Ok(())
    }

    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let fields = match decode_body(collection, &id, &body) {
                Ok(fields) => fields,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable document");
                    continue;
                }
            };
            if fields.get(field) == Some(value) {
                docs.push(Document::new(id, fields));
            }
        }
        Ok(docs)
    }
}
