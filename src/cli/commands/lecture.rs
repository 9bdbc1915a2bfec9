//! Show and delete commands for a single lecture.

use crate::app::App;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the show command.
pub async fn run_show(id: &str, settings: Settings) -> Result<()> {
    let lectures = App::open_lectures(&settings)?;
    match lectures.get(id).await {
        Ok(lecture) => {
            Output::lecture_detail(&lecture);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}

/// Run the delete command.
pub async fn run_delete(id: &str, settings: Settings) -> Result<()> {
    let lectures = App::open_lectures(&settings)?;
    lectures.delete(id).await?;
    Output::success(&format!("Deleted lecture {}", id));
    Ok(())
}
