//! Text generation for lecture enrichment.

mod chat;

pub use chat::ChatGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `user_prompt` under the given system instruction.
    ///
    /// Fails with `LecternError::Generation` on any upstream problem.
    async fn generate(&self, system_instruction: &str, user_prompt: &str) -> Result<String>;

    /// Model identifier, for diagnostics.
    fn model(&self) -> &str;
}
