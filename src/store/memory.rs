//! In-memory record store implementation.
//!
//! Useful for testing and throwaway runs.

use super::{merge_fields, new_document_id, Fields, RecordStore};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

type Collections = HashMap<String, HashMap<String, Fields>>;

/// In-memory record store.
pub struct MemoryRecordStore {
    collections: RwLock<Collections>,
}

impl MemoryRecordStore {
    /// Create a new in-memory record store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|e| LecternError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|e| LecternError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = new_document_id();
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        Ok(self
            .read()?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.write()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| LecternError::NotFound(format!("No document to update: {}", id)))?;
        merge_fields(doc, fields);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(docs) = self.write()?.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn scan_all(&self, collection: &str) -> Result<Vec<(String, Fields)>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| (id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
