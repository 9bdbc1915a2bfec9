//! Application wiring.
//!
//! Builds the store, generator, transcription relay and clock from [`Settings`] and
//! hands them to the services that need them. Everything is constructed once at boot.

use crate::clock::{Clock, SystemClock};
use crate::config::{Prompts, Settings, StoreProvider};
use crate::error::Result;
use crate::generation::{ChatGenerator, Generator};
use crate::lecture::LectureManager;
use crate::orchestrator::Orchestrator;
use crate::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use crate::transcription::{AssemblyAiClient, PollPolicy, TranscriptionClient, TranscriptionRelay};
use std::sync::Arc;
use tracing::info;

/// The assembled services behind the CLI and HTTP surfaces.
pub struct App {
    lectures: LectureManager,
    orchestrator: Orchestrator,
    relay: TranscriptionRelay,
}

impl App {
    /// Build every service from settings.
    ///
    /// Fails if the generation API key is missing. The transcription key is only
    /// checked when a transcription is requested.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = Self::open_store(settings)?;
        let generator: Arc<dyn Generator> =
            Arc::new(ChatGenerator::from_settings(&settings.generation)?);
        let client: Arc<dyn TranscriptionClient> =
            Arc::new(AssemblyAiClient::from_settings(&settings.transcription)?);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        info!(
            "Using {} store, model {}",
            settings.store.provider,
            generator.model()
        );

        Ok(Self::with_components(
            settings,
            store,
            generator,
            client,
            Arc::new(SystemClock),
            prompts,
        ))
    }

    /// Build from explicit components.
    pub fn with_components(
        settings: &Settings,
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn Generator>,
        client: Arc<dyn TranscriptionClient>,
        clock: Arc<dyn Clock>,
        prompts: Prompts,
    ) -> Self {
        let lectures = LectureManager::new(store, clock.clone(), &settings.store.collection);
        let orchestrator = Orchestrator::new(
            lectures.clone(),
            generator,
            prompts,
            settings.generation.max_concurrent,
        );
        let relay = TranscriptionRelay::new(
            client,
            clock,
            PollPolicy::from(&settings.transcription),
            &settings.transcription.language_code,
        );

        Self {
            lectures,
            orchestrator,
            relay,
        }
    }

    /// Open the configured record store.
    pub fn open_store(settings: &Settings) -> Result<Arc<dyn RecordStore>> {
        match settings.store.provider {
            StoreProvider::Sqlite => {
                let path = settings.sqlite_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(Arc::new(SqliteRecordStore::new(&path)?))
            }
            StoreProvider::Memory => Ok(Arc::new(MemoryRecordStore::new())),
        }
    }

    /// Lecture storage alone, for commands that never generate text.
    pub fn open_lectures(settings: &Settings) -> Result<LectureManager> {
        Ok(LectureManager::new(
            Self::open_store(settings)?,
            Arc::new(SystemClock),
            &settings.store.collection,
        ))
    }

    /// The transcription relay alone, for commands that never generate text.
    pub fn open_relay(settings: &Settings) -> Result<TranscriptionRelay> {
        Ok(TranscriptionRelay::new(
            Arc::new(AssemblyAiClient::from_settings(&settings.transcription)?),
            Arc::new(SystemClock),
            PollPolicy::from(&settings.transcription),
            &settings.transcription.language_code,
        ))
    }

    pub fn lectures(&self) -> &LectureManager {
        &self.lectures
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn relay(&self) -> &TranscriptionRelay {
        &self.relay
    }

    /// Name of the model used for generation.
    pub fn model(&self) -> String {
        self.orchestrator.generator().model().to_string()
    }
}
