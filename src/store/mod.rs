//! Document store abstraction for Lectern.
//!
//! Provides a trait-based interface over schemaless JSON documents grouped into
//! collections. Ids are assigned by the store, never by callers.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::error::Result;
use async_trait::async_trait;

/// Top-level fields of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Trait for document store implementations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new document and return its store-assigned id.
    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Fetch a document, or `None` if the id is absent.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>>;

    /// Merge `fields` into an existing document, replacing top-level keys.
    ///
    /// Fails with `NotFound` if the id is absent. The merge is applied as a single write.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Delete a document. Deleting an absent id is a no-op.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    /// Every document in a collection, unordered.
    async fn scan_all(&self, collection: &str) -> Result<Vec<(String, Fields)>>;
}

/// Generate a new document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Replace top-level keys of `target` with those in `patch`.
pub(crate) fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
