//! Process command implementation.

use crate::app::App;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::DerivedField;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(id: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Process, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lectern doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let app = App::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Generating study material with {}...", app.model()));
    let result = app.orchestrator().process(id).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let failed: Vec<String> = DerivedField::ALL
        .iter()
        .filter(|field| result.field(**field) == field.placeholder())
        .map(|field| field.to_string())
        .collect();

    Output::header(&format!("Lecture {}", result.id));
    Output::section("Simple Text", &result.simple_text);
    Output::section("Detailed Steps", &result.detailed_steps);
    Output::section("Mind Map", &result.mind_map);
    Output::section("Summary", &result.summary);
    println!();

    if failed.is_empty() {
        Output::success("All four fields generated.");
    } else {
        Output::warning(&format!("Could not generate: {}", failed.join(", ")));
    }

    Ok(())
}
