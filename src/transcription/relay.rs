//! Upload-and-poll state machine for asynchronous transcription jobs.

use super::{JobStatus, TranscriptionClient, TranscriptionResult};
use crate::clock::Clock;
use crate::config::TranscriptionSettings;
use crate::error::{LecternError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often, and how many times, a job is polled before giving up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

impl From<&TranscriptionSettings> for PollPolicy {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_attempts: settings.max_poll_attempts,
        }
    }
}

/// Where a relay run currently stands.
enum RelayState {
    Uploading(Vec<u8>),
    JobRequested { audio_ref: String },
    Polling { job_id: String, attempt: u32 },
    Completed(TranscriptionResult),
    Errored(LecternError),
    TimedOut,
}

/// Relays audio to a transcription service and waits for the result.
///
/// Polling runs at a fixed interval with a hard attempt cap; there is no backoff and no
/// cancellation. The clock is injected so the wait can be simulated.
pub struct TranscriptionRelay {
    client: Arc<dyn TranscriptionClient>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    language_code: String,
}

impl TranscriptionRelay {
    pub fn new(
        client: Arc<dyn TranscriptionClient>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
        language_code: &str,
    ) -> Self {
        Self {
            client,
            clock,
            policy,
            language_code: language_code.to_string(),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Transcribe raw audio bytes.
    #[instrument(skip_all, fields(bytes = audio.len()))]
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<TranscriptionResult> {
        if audio.is_empty() {
            return Err(LecternError::InvalidInput("Audio file is empty".to_string()));
        }

        let mut state = RelayState::Uploading(audio);
        loop {
            state = match state {
                RelayState::Uploading(audio) => match self.client.upload(audio).await {
                    Ok(audio_ref) => RelayState::JobRequested { audio_ref },
                    Err(e) => RelayState::Errored(e),
                },
                RelayState::JobRequested { audio_ref } => {
                    match self.client.create_job(&audio_ref, &self.language_code).await {
                        Ok(job_id) => {
                            info!("Transcription job {} created", job_id);
                            RelayState::Polling { job_id, attempt: 0 }
                        }
                        Err(e) => RelayState::Errored(e),
                    }
                }
                RelayState::Polling { attempt, .. } if attempt >= self.policy.max_attempts => {
                    RelayState::TimedOut
                }
                RelayState::Polling { job_id, attempt } => {
                    match self.client.job_status(&job_id).await {
                        Ok(status) => self.on_status(job_id, attempt, status).await,
                        Err(e) => RelayState::Errored(e),
                    }
                }
                RelayState::Completed(result) => {
                    info!("Transcription complete ({} words)", result.words);
                    return Ok(result);
                }
                RelayState::Errored(e) => {
                    warn!("Transcription failed: {}", e);
                    return Err(e);
                }
                RelayState::TimedOut => {
                    warn!(
                        "Transcription did not finish after {} attempts",
                        self.policy.max_attempts
                    );
                    return Err(LecternError::Timeout(self.policy.max_attempts));
                }
            };
        }
    }

    /// Transition out of `Polling` for one observed status.
    async fn on_status(&self, job_id: String, attempt: u32, status: JobStatus) -> RelayState {
        match status.status.as_str() {
            JobStatus::COMPLETED => {
                let text = status.text.unwrap_or_default();
                if text.trim().is_empty() {
                    RelayState::Errored(LecternError::NoSpeechDetected)
                } else {
                    RelayState::Completed(TranscriptionResult::new(
                        text,
                        status.confidence.unwrap_or(0.0),
                    ))
                }
            }
            JobStatus::ERROR => RelayState::Errored(LecternError::Upstream(
                status.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            other => {
                debug!("Job {} is {} (attempt {})", job_id, other, attempt + 1);
                self.clock.sleep(self.policy.interval).await;
                RelayState::Polling {
                    job_id,
                    attempt: attempt + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of job statuses, then repeats the last one forever.
    struct ScriptedClient {
        statuses: Mutex<VecDeque<JobStatus>>,
        last: Mutex<JobStatus>,
        polls: Mutex<u32>,
        fail_upload: bool,
        fail_job: bool,
    }

    impl ScriptedClient {
        fn new(statuses: Vec<JobStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                last: Mutex::new(JobStatus::pending("queued")),
                polls: Mutex::new(0),
                fail_upload: false,
                fail_job: false,
            }
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TranscriptionClient for ScriptedClient {
        async fn upload(&self, audio: Vec<u8>) -> Result<String> {
            if self.fail_upload {
                return Err(LecternError::Upstream("Failed to upload audio file".to_string()));
            }
            Ok(format!("https://cdn.example/{}", audio.len()))
        }

        async fn create_job(&self, audio_ref: &str, language_code: &str) -> Result<String> {
            if self.fail_job {
                return Err(LecternError::Upstream("Failed to request transcription".to_string()));
            }
            assert_eq!(language_code, "en");
            assert!(audio_ref.starts_with("https://cdn.example/"));
            Ok("job-1".to_string())
        }

        async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
            assert_eq!(job_id, "job-1");
            *self.polls.lock().unwrap() += 1;
            let next = self.statuses.lock().unwrap().pop_front();
            match next {
                Some(status) => {
                    *self.last.lock().unwrap() = status.clone();
                    Ok(status)
                }
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }

    fn relay(client: Arc<ScriptedClient>, clock: Arc<ManualClock>) -> TranscriptionRelay {
        TranscriptionRelay::new(client, clock, PollPolicy::default(), "en")
    }

    #[tokio::test]
    async fn test_completes_after_processing_polls() {
        let n = 3;
        let mut statuses: Vec<JobStatus> = (0..n).map(|_| JobStatus::pending("processing")).collect();
        statuses.push(JobStatus::completed("hello world", 0.91));

        let client = Arc::new(ScriptedClient::new(statuses));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));
        let result = relay(client.clone(), clock.clone())
            .transcribe(b"RIFF....".to_vec())
            .await
            .unwrap();

        assert_eq!(result.transcription, "hello world");
        assert_eq!(result.words, 2);
        assert!((result.confidence - 0.91).abs() < f64::EPSILON);
        assert_eq!(client.polls(), n + 1);
        assert!(clock.total_slept() >= Duration::from_secs(5 * n as u64));
    }

    #[tokio::test]
    async fn test_never_terminal_times_out() {
        let client = Arc::new(ScriptedClient::new(vec![JobStatus::pending("processing")]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));

        let err = relay(client.clone(), clock.clone())
            .transcribe(vec![0u8; 16])
            .await
            .unwrap_err();

        assert!(matches!(err, LecternError::Timeout(120)));
        assert_eq!(client.polls(), 120);
        assert_eq!(clock.total_slept(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_completed_without_text_is_no_speech() {
        let client = Arc::new(ScriptedClient::new(vec![JobStatus::completed("", 0.0)]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));

        let err = relay(client, clock.clone())
            .transcribe(vec![1])
            .await
            .unwrap_err();

        assert!(matches!(err, LecternError::NoSpeechDetected));
        assert_eq!(clock.total_slept(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_error_status_carries_detail() {
        let client = Arc::new(ScriptedClient::new(vec![
            JobStatus::pending("queued"),
            JobStatus::failed("Audio duration is too short"),
        ]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));

        let err = relay(client, clock).transcribe(vec![1]).await.unwrap_err();

        match err {
            LecternError::Upstream(detail) => assert_eq!(detail, "Audio duration is too short"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_confidence_defaults_to_zero() {
        let status = JobStatus {
            status: "completed".to_string(),
            text: Some("one two three".to_string()),
            confidence: None,
            error: None,
        };
        let client = Arc::new(ScriptedClient::new(vec![status]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));

        let result = relay(client, clock).transcribe(vec![1]).await.unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.words, 3);
    }

    #[tokio::test]
    async fn test_upload_and_job_failures_are_upstream() {
        let clock = Arc::new(ManualClock::frozen(Utc::now()));

        let mut client = ScriptedClient::new(vec![]);
        client.fail_upload = true;
        let err = relay(Arc::new(client), clock.clone())
            .transcribe(vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Upstream(_)));

        let mut client = ScriptedClient::new(vec![]);
        client.fail_job = true;
        let client = Arc::new(client);
        let err = relay(client.clone(), clock)
            .transcribe(vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Upstream(_)));
        assert_eq!(client.polls(), 0);
    }

    #[tokio::test]
    async fn test_empty_audio_is_rejected_locally() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));
        let err = relay(client.clone(), clock).transcribe(Vec::new()).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidInput(_)));
        assert_eq!(client.polls(), 0);
    }

    #[tokio::test]
    async fn test_custom_policy_bounds_attempts() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let clock = Arc::new(ManualClock::frozen(Utc::now()));
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 3,
        };
        let relay = TranscriptionRelay::new(client.clone(), clock.clone(), policy, "en");

        let err = relay.transcribe(vec![1]).await.unwrap_err();
        assert!(matches!(err, LecternError::Timeout(3)));
        assert_eq!(client.polls(), 3);
        assert_eq!(clock.total_slept(), Duration::from_secs(6));
    }
}
