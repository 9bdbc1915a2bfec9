//! Configuration module for Lectern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{LecturePrompts, PromptTemplate, Prompts};
pub use settings::{
    GeneralSettings, GenerationSettings, PromptSettings, ServerSettings, Settings,
    StoreProvider, StoreSettings, TranscriptionSettings,
};
