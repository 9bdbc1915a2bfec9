//! Lecture processing orchestrator.
//!
//! Turns a stored transcription into the four derived study aids. Each field is
//! generated independently; a failed generation is replaced by a fixed placeholder
//! so one bad call never sinks the whole request.

use crate::config::{LecturePrompts, PromptTemplate, Prompts};
use crate::error::{LecternError, Result};
use crate::generation::Generator;
use crate::lecture::LectureManager;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One of the four fields produced by processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedField {
    Breakdown,
    Steps,
    MindMap,
    Summary,
}

impl DerivedField {
    pub const ALL: [DerivedField; 4] = [
        DerivedField::Breakdown,
        DerivedField::Steps,
        DerivedField::MindMap,
        DerivedField::Summary,
    ];

    /// Text stored in place of output that could not be generated.
    pub fn placeholder(self) -> &'static str {
        match self {
            DerivedField::Breakdown => "Error generating breakdown",
            DerivedField::Steps => "Error generating steps",
            DerivedField::MindMap => "Error generating mind map",
            DerivedField::Summary => "Error generating summary",
        }
    }

    /// Document key the field is stored under.
    pub fn key(self) -> &'static str {
        match self {
            DerivedField::Breakdown => "simpleText",
            DerivedField::Steps => "detailedSteps",
            DerivedField::MindMap => "mindMap",
            DerivedField::Summary => "summary",
        }
    }

    fn template(self, prompts: &LecturePrompts) -> &PromptTemplate {
        match self {
            DerivedField::Breakdown => &prompts.breakdown,
            DerivedField::Steps => &prompts.steps,
            DerivedField::MindMap => &prompts.mind_map,
            DerivedField::Summary => &prompts.summary,
        }
    }
}

impl std::fmt::Display for DerivedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivedField::Breakdown => write!(f, "breakdown"),
            DerivedField::Steps => write!(f, "steps"),
            DerivedField::MindMap => write!(f, "mind map"),
            DerivedField::Summary => write!(f, "summary"),
        }
    }
}

/// Outcome of a single generation task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Generated(String),
    Failed(String),
}

impl TaskOutcome {
    /// The text to store: generated output, or the field's placeholder.
    pub fn into_text(self, field: DerivedField) -> String {
        match self {
            TaskOutcome::Generated(text) => text,
            TaskOutcome::Failed(_) => field.placeholder().to_string(),
        }
    }
}

/// Result of processing a lecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub id: String,
    pub simple_text: String,
    pub detailed_steps: String,
    pub mind_map: String,
    pub summary: String,
}

impl ProcessingResult {
    fn assemble(id: &str, mut outcomes: HashMap<DerivedField, TaskOutcome>) -> Self {
        let mut take = |field: DerivedField| {
            outcomes
                .remove(&field)
                .unwrap_or_else(|| TaskOutcome::Failed("task did not run".to_string()))
                .into_text(field)
        };

        Self {
            id: id.to_string(),
            simple_text: take(DerivedField::Breakdown),
            detailed_steps: take(DerivedField::Steps),
            mind_map: take(DerivedField::MindMap),
            summary: take(DerivedField::Summary),
        }
    }

    /// Text produced for `field`.
    pub fn field(&self, field: DerivedField) -> &str {
        match field {
            DerivedField::Breakdown => &self.simple_text,
            DerivedField::Steps => &self.detailed_steps,
            DerivedField::MindMap => &self.mind_map,
            DerivedField::Summary => &self.summary,
        }
    }
}

/// Coordinates lecture processing: load, generate, merge, persist.
pub struct Orchestrator {
    lectures: LectureManager,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    max_concurrent: usize,
}

impl Orchestrator {
    pub fn new(
        lectures: LectureManager,
        generator: Arc<dyn Generator>,
        prompts: Prompts,
        max_concurrent: usize,
    ) -> Self {
        Self {
            lectures,
            generator,
            prompts,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn lectures(&self) -> &LectureManager {
        &self.lectures
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        self.generator.clone()
    }

    /// Generate all four derived fields for a lecture and store them in one update.
    #[instrument(skip(self))]
    pub async fn process(&self, id: &str) -> Result<ProcessingResult> {
        let lecture = self.lectures.get(id).await?;

        if lecture.transcription.trim().is_empty() {
            warn!("Lecture {} has no transcription", id);
            return Err(LecternError::InvalidState(
                "No transcription to process".to_string(),
            ));
        }

        info!(
            "Processing {} characters of transcription for lecture {}",
            lecture.transcription.len(),
            id
        );

        let outcomes: HashMap<DerivedField, TaskOutcome> = stream::iter(DerivedField::ALL)
            .map(|field| {
                let transcription = lecture.transcription.as_str();
                async move { (field, self.run_task(field, transcription).await) }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let failed = outcomes
            .values()
            .filter(|o| matches!(o, TaskOutcome::Failed(_)))
            .count();
        let result = ProcessingResult::assemble(id, outcomes);

        let mut fields = crate::store::Fields::new();
        for field in DerivedField::ALL {
            fields.insert(field.key().to_string(), result.field(field).into());
        }
        self.lectures.write_fields(id, fields).await?;

        info!(
            "Processing complete for lecture {} ({} of 4 fields failed)",
            id, failed
        );
        Ok(result)
    }

    async fn run_task(&self, field: DerivedField, transcription: &str) -> TaskOutcome {
        let template = field.template(&self.prompts.lecture);
        let mut vars = HashMap::new();
        vars.insert("transcription".to_string(), transcription.to_string());
        let prompt = self.prompts.render_with_custom(&template.user, &vars);

        info!("Generating {}...", field);
        match self.generator.generate(&template.system, &prompt).await {
            Ok(text) => {
                info!("Generated {} ({} chars)", field, text.len());
                TaskOutcome::Generated(text)
            }
            Err(e) => {
                warn!("Generating {} failed: {}", field, e);
                TaskOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::store::MemoryRecordStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by echoing the system instruction; fails for instructions containing `fail_on`.
    struct ScriptedGenerator {
        fail_on: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.iter().any(|f| system.contains(f)) {
                return Err(LecternError::Generation("rate limited".to_string()));
            }
            if system.contains("syllables") {
                return Ok("The cat sat.".to_string());
            }
            if system.contains("educator") {
                return Ok("1. Notice the cat\n2. Observe it sit".to_string());
            }
            if system.contains("summarizer") {
                return Ok("A cat sat. It was calm. Nothing else happened.".to_string());
            }
            assert!(prompt.contains("The cat sat."));
            Ok("- cat\n- sitting".to_string())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn setup(generator: Arc<ScriptedGenerator>, max_concurrent: usize) -> Orchestrator {
        let clock = ManualClock::ticking(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            chrono::Duration::seconds(1),
        );
        let lectures = LectureManager::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(clock),
            "lectures",
        );
        Orchestrator::new(lectures, generator, Prompts::default(), max_concurrent)
    }

    #[tokio::test]
    async fn test_process_fills_and_persists_all_fields() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let orchestrator = setup(generator.clone(), 4);
        let lecture = orchestrator.lectures().create("u1", "The cat sat.").await.unwrap();

        let result = orchestrator.process(&lecture.id).await.unwrap();

        assert_eq!(result.id, lecture.id);
        assert!(result.detailed_steps.starts_with("1."));
        assert_eq!(result.mind_map, "- cat\n- sitting");
        for field in DerivedField::ALL {
            assert_ne!(result.field(field), field.placeholder());
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);

        let stored = orchestrator.lectures().get(&lecture.id).await.unwrap();
        assert_eq!(stored.simple_text, result.simple_text);
        assert_eq!(stored.detailed_steps, result.detailed_steps);
        assert_eq!(stored.mind_map, result.mind_map);
        assert_eq!(stored.summary, result.summary);
        assert_eq!(stored.transcription, "The cat sat.");
        assert!(stored.updated_at > stored.created_at);
    }

    #[tokio::test]
    async fn test_single_failure_gets_placeholder() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["mind maps"]));
        let orchestrator = setup(generator, 1);
        let lecture = orchestrator.lectures().create("u1", "The cat sat.").await.unwrap();

        let result = orchestrator.process(&lecture.id).await.unwrap();

        assert_eq!(result.mind_map, "Error generating mind map");
        assert_eq!(result.simple_text, "The cat sat.");
        assert_ne!(result.summary, DerivedField::Summary.placeholder());

        let stored = orchestrator.lectures().get(&lecture.id).await.unwrap();
        assert_eq!(stored.mind_map, "Error generating mind map");
    }

    #[tokio::test]
    async fn test_all_failures_still_succeed() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["expert"]));
        let orchestrator = setup(generator, 4);
        let lecture = orchestrator.lectures().create("u1", "Some text").await.unwrap();

        let result = orchestrator.process(&lecture.id).await.unwrap();

        assert_eq!(result.simple_text, "Error generating breakdown");
        assert_eq!(result.detailed_steps, "Error generating steps");
        assert_eq!(result.mind_map, "Error generating mind map");
        assert_eq!(result.summary, "Error generating summary");
    }

    #[tokio::test]
    async fn test_empty_transcription_is_invalid_state() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let orchestrator = setup(generator.clone(), 4);
        let lecture = orchestrator.lectures().create("u1", "  ").await.unwrap();

        let err = orchestrator.process(&lecture.id).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidState(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let stored = orchestrator.lectures().get(&lecture.id).await.unwrap();
        assert_eq!(stored, lecture);
    }

    #[tokio::test]
    async fn test_missing_lecture_is_not_found() {
        let orchestrator = setup(Arc::new(ScriptedGenerator::new(vec![])), 4);
        let err = orchestrator.process("missing").await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[test]
    fn test_outcome_maps_failure_to_placeholder() {
        let outcome = TaskOutcome::Failed("timeout".to_string());
        assert_eq!(outcome.into_text(DerivedField::Steps), "Error generating steps");
        let outcome = TaskOutcome::Generated("ok".to_string());
        assert_eq!(outcome.into_text(DerivedField::Steps), "ok");
    }
}
