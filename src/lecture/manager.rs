//! Create, fetch, list, patch and delete lecture records.

use super::{sort_newest_first, Lecture, LecturePatch};
use crate::clock::Clock;
use crate::error::{LecternError, Result};
use crate::store::{Fields, RecordStore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Lifecycle operations over lecture records in a single collection.
///
/// Per-user queries scan the whole collection and filter in memory, which keeps the
/// store interface free of secondary indexes at the cost of linear reads.
#[derive(Clone)]
pub struct LectureManager {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    collection: String,
}

impl LectureManager {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, collection: &str) -> Self {
        Self {
            store,
            clock,
            collection: collection.to_string(),
        }
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Store a new lecture with empty derived fields.
    ///
    /// An empty transcription is accepted here; it is rejected only when processing.
    #[instrument(skip(self, transcription), fields(chars = transcription.len()))]
    pub async fn create(&self, user_id: &str, transcription: &str) -> Result<Lecture> {
        let mut lecture = Lecture::new(user_id, transcription, self.clock.now());
        lecture.id = self
            .store
            .create_document(&self.collection, lecture.to_document()?)
            .await?;

        info!("Created lecture {} for user {}", lecture.id, user_id);
        Ok(lecture)
    }

    /// Fetch a lecture by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Lecture> {
        let fields = self
            .store
            .get_document(&self.collection, id)
            .await?
            .ok_or_else(|| LecternError::lecture_not_found(id))?;
        Lecture::from_document(id, fields)
    }

    /// The most recently created lecture for a user.
    #[instrument(skip(self))]
    pub async fn latest_for_user(&self, user_id: &str) -> Result<Lecture> {
        let lectures = self.list_for_user(user_id).await?;
        let count = lectures.len();
        let latest = lectures.into_iter().next().ok_or_else(|| {
            LecternError::NotFound(format!("No lectures found for user: {}", user_id))
        })?;

        debug!("Found {} lecture(s), latest is {}", count, latest.id);
        Ok(latest)
    }

    /// All lectures for a user, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Lecture>> {
        let mut lectures: Vec<Lecture> = self
            .scan()
            .await?
            .into_iter()
            .filter(|l| l.user_id == user_id)
            .collect();
        sort_newest_first(&mut lectures);

        debug!("Found {} lecture(s) for user {}", lectures.len(), user_id);
        Ok(lectures)
    }

    /// Every lecture in the collection, newest first.
    pub async fn list_all(&self) -> Result<Vec<Lecture>> {
        let mut lectures = self.scan().await?;
        sort_newest_first(&mut lectures);
        Ok(lectures)
    }

    /// Apply the provided fields and bump `updatedAt`.
    #[instrument(skip(self, patch))]
    pub async fn patch(&self, id: &str, patch: &LecturePatch) -> Result<Lecture> {
        if patch.is_empty() {
            debug!("Empty patch for lecture {}, only touching updatedAt", id);
        }
        self.write_fields(id, patch.to_document()?).await?;

        debug!("Patched lecture {}", id);
        self.get(id).await
    }

    /// Write `fields` plus a fresh `updatedAt` to an existing lecture in one store update.
    pub(crate) async fn write_fields(&self, id: &str, mut fields: Fields) -> Result<()> {
        fields.insert(
            "updatedAt".to_string(),
            serde_json::to_value(self.clock.now())?,
        );
        self.store
            .update_document(&self.collection, id, fields)
            .await
            .map_err(|e| match e {
                LecternError::NotFound(_) => LecternError::lecture_not_found(id),
                other => other,
            })
    }

    /// Delete a lecture. Deleting an absent id succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete_document(&self.collection, id).await?;
        info!("Deleted lecture {}", id);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Lecture>> {
        let docs = self.store.scan_all(&self.collection).await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, fields)| match Lecture::from_document(&id, fields) {
                Ok(lecture) => Some(lecture),
                Err(e) => {
                    warn!("Skipping unreadable record: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::store::MemoryRecordStore;
    use chrono::{TimeZone, Utc};

    fn manager() -> LectureManager {
        let clock = ManualClock::ticking(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            chrono::Duration::seconds(1),
        );
        LectureManager::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(clock),
            "lectures",
        )
    }

    #[tokio::test]
    async fn test_create_sets_equal_timestamps_and_empty_fields() {
        let manager = manager();
        let lecture = manager.create("u1", "The cat sat.").await.unwrap();

        assert!(!lecture.id.is_empty());
        assert_eq!(lecture.created_at, lecture.updated_at);
        assert_eq!(lecture.simple_text, "");
        assert_eq!(lecture.summary, "");

        let fetched = manager.get(&lecture.id).await.unwrap();
        assert_eq!(fetched, lecture);
    }

    #[tokio::test]
    async fn test_create_accepts_empty_transcription() {
        let manager = manager();
        let lecture = manager.create("u1", "").await.unwrap();
        assert_eq!(lecture.transcription, "");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let err = manager().get("missing").await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_and_list_for_user() {
        let manager = manager();
        let first = manager.create("u1", "one").await.unwrap();
        manager.create("u2", "other user").await.unwrap();
        let second = manager.create("u1", "two").await.unwrap();

        let latest = manager.latest_for_user("u1").await.unwrap();
        assert_eq!(latest.id, second.id);

        let listed = manager.list_for_user("u1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(manager.list_for_user("nobody").await.unwrap().is_empty());
        assert_eq!(manager.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_latest_for_unknown_user_is_not_found() {
        let manager = manager();
        manager.create("u1", "one").await.unwrap();
        let err = manager.latest_for_user("u9").await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patch_changes_only_provided_fields() {
        let manager = manager();
        let created = manager.create("u1", "original").await.unwrap();

        let patch = LecturePatch {
            summary: Some("A short summary.".to_string()),
            ..Default::default()
        };
        let patched = manager.patch(&created.id, &patch).await.unwrap();

        assert_eq!(patched.summary, "A short summary.");
        assert_eq!(patched.transcription, "original");
        assert_eq!(patched.simple_text, "");
        assert_eq!(patched.created_at, created.created_at);
        assert!(patched.updated_at > created.updated_at);

        let again = manager.patch(&created.id, &LecturePatch::default()).await.unwrap();
        assert!(again.updated_at > patched.updated_at);
        assert_eq!(again.summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let err = manager()
            .patch("missing", &LecturePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let manager = manager();
        let lecture = manager.create("u1", "bye").await.unwrap();

        manager.delete(&lecture.id).await.unwrap();
        assert!(matches!(
            manager.get(&lecture.id).await.unwrap_err(),
            LecternError::NotFound(_)
        ));
        manager.delete(&lecture.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreadable_records_are_skipped() {
        let manager = manager();
        manager.create("u1", "good").await.unwrap();
        let mut junk = crate::store::Fields::new();
        junk.insert("userId".to_string(), serde_json::json!("u1"));
        manager.store().create_document("lectures", junk).await.unwrap();

        assert_eq!(manager.list_for_user("u1").await.unwrap().len(), 1);
    }
}
