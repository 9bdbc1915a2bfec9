//! Speech transcription relay.
//!
//! Uploaded audio is forwarded to a hosted transcription service, which works
//! asynchronously: upload, request a job, then poll the job until it finishes.

mod assemblyai;
mod relay;

pub use assemblyai::AssemblyAiClient;
pub use relay::{PollPolicy, TranscriptionRelay};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status of a transcription job as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub const COMPLETED: &'static str = "completed";
    pub const ERROR: &'static str = "error";

    /// A job still queued or running.
    pub fn pending(status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub fn completed(text: &str, confidence: f64) -> Self {
        Self {
            status: Self::COMPLETED.to_string(),
            text: Some(text.to_string()),
            confidence: Some(confidence),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            status: Self::ERROR.to_string(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// A finished transcription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub transcription: String,
    pub confidence: f64,
    /// Number of whitespace-delimited tokens in `transcription`.
    pub words: usize,
}

impl TranscriptionResult {
    pub fn new(text: String, confidence: f64) -> Self {
        let words = text.split_whitespace().count();
        Self {
            transcription: text,
            confidence,
            words,
        }
    }
}

/// Trait for asynchronous transcription services.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Upload raw audio, returning a reference the service can fetch it by.
    async fn upload(&self, audio: Vec<u8>) -> Result<String>;

    /// Request a transcription job for uploaded audio, returning the job id.
    async fn create_job(&self, audio_ref: &str, language_code: &str) -> Result<String>;

    /// Fetch the current status of a job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatus>;
}
