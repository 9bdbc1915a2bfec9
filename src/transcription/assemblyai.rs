//! AssemblyAI transcription client.

use super::{JobStatus, TranscriptionClient};
use crate::config::TranscriptionSettings;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct JobResponse {
    id: String,
}

/// Client for the AssemblyAI v2 REST API.
///
/// The API key is read from the environment on every call, so a server can start
/// without it and report the problem only when transcription is attempted.
pub struct AssemblyAiClient {
    http: reqwest::Client,
    base: Url,
    api_key_env: String,
}

impl AssemblyAiClient {
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        Self::new(&settings.api_base, &settings.api_key_env)
    }

    pub fn new(api_base: &str, api_key_env: &str) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'
        let normalized = format!("{}/", api_base.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| {
            LecternError::Config(format!("Invalid transcription API base {}: {}", api_base, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            http,
            base,
            api_key_env: api_key_env.to_string(),
        })
    }

    fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(LecternError::Config(format!(
                "AssemblyAI API key not configured. Please set {}.",
                self.api_key_env
            ))),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| LecternError::Config(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl TranscriptionClient for AssemblyAiClient {
    #[instrument(skip_all, fields(bytes = audio.len()))]
    async fn upload(&self, audio: Vec<u8>) -> Result<String> {
        let key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint("upload")?)
            .header("authorization", key)
            .body(audio)
            .send()
            .await
            .map_err(|e| LecternError::Upstream(format!("Failed to upload audio file: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::Upstream(format!(
                "Failed to upload audio file ({}): {}",
                status, body
            )));
        }

        let upload: UploadResponse = response.json().await?;
        debug!("Uploaded audio");
        Ok(upload.upload_url)
    }

    #[instrument(skip(self, audio_ref))]
    async fn create_job(&self, audio_ref: &str, language_code: &str) -> Result<String> {
        let key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint("transcript")?)
            .header("authorization", key)
            .json(&serde_json::json!({
                "audio_url": audio_ref,
                "language_code": language_code,
            }))
            .send()
            .await
            .map_err(|e| LecternError::Upstream(format!("Failed to request transcription: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::Upstream(format!(
                "Failed to request transcription ({}): {}",
                status, body
            )));
        }

        let job: JobResponse = response.json().await?;
        debug!("Created transcription job {}", job.id);
        Ok(job.id)
    }

    #[instrument(skip(self))]
    async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let key = self.api_key()?;
        let response = self
            .http
            .get(self.endpoint(&format!("transcript/{}", job_id))?)
            .header("authorization", key)
            .send()
            .await?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_keep_version_segment() {
        let client = AssemblyAiClient::new("https://api.assemblyai.com/v2", "UNUSED").unwrap();
        assert_eq!(
            client.endpoint("upload").unwrap().as_str(),
            "https://api.assemblyai.com/v2/upload"
        );
        assert_eq!(
            client.endpoint("transcript/abc").unwrap().as_str(),
            "https://api.assemblyai.com/v2/transcript/abc"
        );
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = AssemblyAiClient::new("not a url", "UNUSED").err().unwrap();
        assert!(matches!(err, LecternError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client =
            AssemblyAiClient::new("http://127.0.0.1:9", "LECTERN_TEST_ASSEMBLYAI_NEVER_SET")
                .unwrap();
        let err = client.upload(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, LecternError::Config(_)));
    }

    #[test]
    fn test_status_payload_parses() {
        let status: JobStatus = serde_json::from_str(
            r#"{"id": "j1", "status": "completed", "text": "hello world", "confidence": 0.93}"#,
        )
        .unwrap();
        assert_eq!(status, JobStatus::completed("hello world", 0.93));

        let status: JobStatus =
            serde_json::from_str(r#"{"status": "error", "error": "bad audio", "text": null}"#)
                .unwrap();
        assert_eq!(status, JobStatus::failed("bad audio"));
    }
}
