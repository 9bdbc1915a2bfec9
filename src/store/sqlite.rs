//! SQLite-based record store implementation.
//!
//! Documents are kept as JSON text in a single table keyed by `(collection, id)`.
//! Per-user queries scan and filter in Rust; there is no secondary index on document fields.

use super::{merge_fields, new_document_id, Fields, RecordStore};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        fields_json TEXT NOT NULL,
        written_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );
"#;

/// SQLite-based record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a SQLite record store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite record store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite record store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecternError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn decode(json: &str) -> Result<Fields> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Object(fields) => Ok(fields),
            other => Err(LecternError::Store(format!(
                "Stored document is not an object: {}",
                other
            ))),
        }
    }

    fn encode(fields: &Fields) -> Result<String> {
        Ok(serde_json::to_string(fields)?)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self, fields))]
    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String> {
        let conn = self.lock()?;
        let id = new_document_id();

        conn.execute(
            "INSERT INTO documents (collection, id, fields_json, written_at) VALUES (?1, ?2, ?3, ?4)",
            params![collection, id, Self::encode(&fields)?, Utc::now().to_rfc3339()],
        )?;

        debug!("Created document {}/{}", collection, id);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let conn = self.lock()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT fields_json FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        json.as_deref().map(Self::decode).transpose()
    }

    #[instrument(skip(self, fields))]
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let json: Option<String> = tx
            .query_row(
                "SELECT fields_json FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        let mut doc = match json {
            Some(json) => Self::decode(&json)?,
            None => {
                return Err(LecternError::NotFound(format!(
                    "No document to update: {}",
                    id
                )))
            }
        };
        merge_fields(&mut doc, fields);

        tx.execute(
            "UPDATE documents SET fields_json = ?1, written_at = ?2 WHERE collection = ?3 AND id = ?4",
            params![Self::encode(&doc)?, Utc::now().to_rfc3339(), collection, id],
        )?;
        tx.commit()?;

        debug!("Updated document {}/{}", collection, id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;

        debug!("Deleted {} document(s) for {}/{}", deleted, collection, id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn scan_all(&self, collection: &str) -> Result<Vec<(String, Fields)>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id, fields_json FROM documents WHERE collection = ?1")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, json) = row?;
            docs.push((id, Self::decode(&json)?));
        }

        debug!("Scanned {} documents in {}", docs.len(), collection);
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_sqlite_record_store() {
        let store = SqliteRecordStore::in_memory().unwrap();

        let a = store
            .create_document("lectures", fields(json!({"userId": "u1", "mindMap": ""})))
            .await
            .unwrap();
        let b = store
            .create_document("lectures", fields(json!({"userId": "u2"})))
            .await
            .unwrap();
        assert_ne!(a, b);

        store
            .update_document("lectures", &a, fields(json!({"mindMap": "- point"})))
            .await
            .unwrap();

        let doc = store.get_document("lectures", &a).await.unwrap().unwrap();
        assert_eq!(doc["userId"], "u1");
        assert_eq!(doc["mindMap"], "- point");

        let all = store.scan_all("lectures").await.unwrap();
        assert_eq!(all.len(), 2);

        store.delete_document("lectures", &a).await.unwrap();
        store.delete_document("lectures", &a).await.unwrap();
        assert!(store.get_document("lectures", &a).await.unwrap().is_none());
        assert_eq!(store.scan_all("lectures").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let err = store
            .update_document("lectures", "missing", fields(json!({"summary": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_documents_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lectures.db");

        let id = {
            let store = SqliteRecordStore::new(&path).unwrap();
            store
                .create_document("lectures", fields(json!({"transcription": "kept"})))
                .await
                .unwrap()
        };

        let store = SqliteRecordStore::new(&path).unwrap();
        let doc = store.get_document("lectures", &id).await.unwrap().unwrap();
        assert_eq!(doc["transcription"], "kept");
    }
}
