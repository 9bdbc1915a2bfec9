//! Lectern - Lecture Transcription Backend
//!
//! Stores lecture transcriptions and turns each one into study material with an LLM.
//!
//! # Overview
//!
//! Lectern allows you to:
//! - Transcribe uploaded lecture audio through a hosted speech-to-text service
//! - Store lecture transcriptions per user
//! - Generate a simplified breakdown, step-by-step notes, a mind map and a summary
//! - Serve all of the above over a small JSON HTTP API
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `store` - Document store abstraction (SQLite, in-memory)
//! - `lecture` - Lecture records and their lifecycle
//! - `generation` - Text generation through chat completions
//! - `orchestrator` - Derived-field generation for a lecture
//! - `transcription` - Upload-and-poll transcription relay
//! - `clock` - Injectable time source
//! - `app` - Service wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::app::App;
//! use lectern::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let app = App::from_settings(&settings)?;
//!
//!     let lecture = app.lectures().create("user-1", "Photosynthesis converts light.").await?;
//!     let result = app.orchestrator().process(&lecture.id).await?;
//!     println!("{}", result.summary);
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod generation;
pub mod lecture;
pub mod openai;
pub mod orchestrator;
pub mod store;
pub mod transcription;

pub use error::{LecternError, Result};
