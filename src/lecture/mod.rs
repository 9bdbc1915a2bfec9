//! Lecture records and their lifecycle.

mod manager;

pub use manager::LectureManager;

use crate::error::{LecternError, Result};
use crate::store::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored lecture: the source transcription plus its four derived study aids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    /// Store-assigned id. Not part of the stored document body.
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub transcription: String,
    /// Syllable-hyphenated rewrite of the transcription.
    #[serde(default)]
    pub simple_text: String,
    #[serde(default)]
    pub detailed_steps: String,
    #[serde(default)]
    pub mind_map: String,
    #[serde(default)]
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lecture {
    /// A fresh lecture with empty derived fields, not yet stored.
    pub fn new(user_id: &str, transcription: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            transcription: transcription.to_string(),
            simple_text: String::new(),
            detailed_steps: String::new(),
            mind_map: String::new(),
            summary: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a lecture from a stored document and its id.
    pub fn from_document(id: &str, mut fields: Fields) -> Result<Self> {
        fields.insert("id".to_string(), serde_json::Value::String(id.to_string()));
        serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
            LecternError::Store(format!("Malformed lecture document {}: {}", id, e))
        })
    }

    /// The stored document body (everything except the id).
    pub fn to_document(&self) -> Result<Fields> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            _ => Err(LecternError::Store("Lecture did not serialize to an object".to_string())),
        }
    }
}

/// Explicitly provided field updates. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mind_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl LecturePatch {
    pub fn is_empty(&self) -> bool {
        self == &LecturePatch::default()
    }

    /// Document fields for the provided values only.
    pub fn to_document(&self) -> Result<Fields> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(fields),
            _ => Ok(Fields::new()),
        }
    }
}

/// Order lectures newest first, breaking `createdAt` ties by ascending id.
pub fn sort_newest_first(lectures: &mut [Lecture]) {
    lectures.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_document_round_trip_keeps_id_out_of_body() {
        let mut lecture = Lecture::new("u1", "The cat sat.", at(0));
        lecture.id = "abc".to_string();

        let doc = lecture.to_document().unwrap();
        assert!(!doc.contains_key("id"));
        assert_eq!(doc["userId"], "u1");
        assert_eq!(doc["simpleText"], "");

        let restored = Lecture::from_document("abc", doc).unwrap();
        assert_eq!(restored, lecture);
    }

    #[test]
    fn test_missing_derived_fields_default_to_empty() {
        let doc = serde_json::json!({
            "userId": "u1",
            "transcription": "hi",
            "createdAt": at(0),
            "updatedAt": at(0),
        });
        let lecture = Lecture::from_document("x", doc.as_object().unwrap().clone()).unwrap();
        assert_eq!(lecture.summary, "");
    }

    #[test]
    fn test_patch_only_writes_provided_fields() {
        let patch: LecturePatch =
            serde_json::from_str(r#"{"summary": "short", "mindMap": null}"#).unwrap();
        let doc = patch.to_document().unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(doc["summary"], "short");
        assert!(!patch.is_empty());
        assert!(LecturePatch::default().is_empty());
    }

    #[test]
    fn test_sort_breaks_ties_by_id() {
        let mut lectures = vec![
            Lecture { id: "b".into(), ..Lecture::new("u", "", at(1)) },
            Lecture { id: "c".into(), ..Lecture::new("u", "", at(0)) },
            Lecture { id: "a".into(), ..Lecture::new("u", "", at(1)) },
        ];
        sort_newest_first(&mut lectures);
        let ids: Vec<_> = lectures.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
