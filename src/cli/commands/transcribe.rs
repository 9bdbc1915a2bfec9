//! Transcribe command implementation.

use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::{Context, Result};

/// Run the transcribe command.
pub async fn run_transcribe(file: &str, user: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Transcribe, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let path = Settings::expand_path(file);
    let audio = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let relay = App::open_relay(&settings)?;
    let policy = relay.policy();
    let spinner = Output::spinner(&format!(
        "Transcribing {} (up to {}s)...",
        path.display(),
        policy.interval.as_secs() * u64::from(policy.max_attempts)
    ));
    let result = relay.transcribe(audio).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Transcribed {} words (confidence {:.2})",
        result.words, result.confidence
    ));

    if let Some(user_id) = user {
        let lectures = App::open_lectures(&settings)?;
        let lecture = lectures.create(&user_id, &result.transcription).await?;
        Output::kv("Lecture", &lecture.id);
        Output::info(&format!("Run 'lectern process {}' to generate study material.", lecture.id));
    } else {
        println!();
        println!("{}", result.transcription);
    }

    Ok(())
}
