//! Chat completion generator for OpenAI-compatible APIs.

use super::Generator;
use crate::config::GenerationSettings;
use crate::error::{LecternError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Generator backed by a chat completion endpoint.
pub struct ChatGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatGenerator {
    /// Create a generator from settings, reading the API key from the environment.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let api_key = settings.api_key()?;
        Ok(Self::with_config(settings, &api_key))
    }

    /// Create a generator with an explicit API key.
    pub fn with_config(settings: &GenerationSettings, api_key: &str) -> Self {
        Self {
            client: create_client(
                &settings.api_base,
                api_key,
                Duration::from_secs(settings.timeout_seconds),
            ),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = user_prompt.len()))]
    async fn generate(&self, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_instruction)
                .build()
                .map_err(|e| LecternError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| LecternError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LecternError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            LecternError::Generation(format!("{} API error: {}", self.model, e))
        })?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LecternError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received {} characters", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
