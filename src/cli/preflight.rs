//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are available before starting operations
//! that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{LecternError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Transcription requires the transcription service key.
    Transcribe,
    /// Processing requires the generation key.
    Process,
    /// Listing and showing only need the store.
    Browse,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcribe => check_api_key(&settings.transcription.api_key_env)?,
        Operation::Process => check_api_key(&settings.generation.api_key_env)?,
        Operation::Browse => {}
    }
    Ok(())
}

/// Check that an API key environment variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(LecternError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(LecternError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_browse_no_requirements() {
        assert!(check(Operation::Browse, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_key_names_the_variable() {
        let mut settings = Settings::default();
        settings.transcription.api_key_env = "LECTERN_TEST_PREFLIGHT_NEVER_SET".to_string();

        let err = check(Operation::Transcribe, &settings).unwrap_err();
        assert!(err.to_string().contains("LECTERN_TEST_PREFLIGHT_NEVER_SET"));
    }
}
