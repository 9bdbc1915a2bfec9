//! List command implementation.

use crate::app::App;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(user: Option<&str>, settings: Settings) -> Result<()> {
    let lectures = App::open_lectures(&settings)?;

    let listed = match user {
        Some(user_id) => lectures.list_for_user(user_id).await,
        None => lectures.list_all().await,
    };

    match listed {
        Ok(items) => {
            if items.is_empty() {
                Output::info("No lectures yet. Use 'lectern create' or 'lectern transcribe' to add one.");
            } else {
                let heading = match user {
                    Some(user_id) => format!("Lectures for {} ({})", user_id, items.len()),
                    None => format!("Lectures ({})", items.len()),
                };
                Output::header(&heading);
                println!();

                for lecture in &items {
                    Output::lecture_item(lecture);
                }

                let processed = items.iter().filter(|l| !l.summary.is_empty()).count();
                println!();
                Output::kv("Total lectures", &items.len().to_string());
                Output::kv("Processed", &processed.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list lectures: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
