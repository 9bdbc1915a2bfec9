//! Create command implementation.

use crate::app::App;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::{Context, Result};

/// Run the create command.
pub async fn run_create(
    user: &str,
    text: Option<String>,
    file: Option<String>,
    settings: Settings,
) -> Result<()> {
    let transcription = match (text, file) {
        (Some(text), _) => text,
        (None, Some(file)) => {
            let path = Settings::expand_path(&file);
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        (None, None) => anyhow::bail!("Either --text or --file is required"),
    };

    if transcription.trim().is_empty() {
        Output::warning("Transcription is empty; this lecture cannot be processed until it is edited.");
    }

    let lectures = App::open_lectures(&settings)?;
    let lecture = lectures.create(user, &transcription).await?;

    Output::success(&format!("Created lecture {}", lecture.id));
    Output::kv("User", &lecture.user_id);
    Output::kv("Characters", &lecture.transcription.len().to_string());

    Ok(())
}
