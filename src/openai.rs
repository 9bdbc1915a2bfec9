//! OpenAI-compatible client configuration.
//!
//! Groq and other hosted LLM providers speak the OpenAI chat completion protocol,
//! so the same client works against any of them given a base URL and key.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for an OpenAI-compatible API with a request timeout.
pub fn create_client(api_base: &str, api_key: &str, timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Client::with_config(config).with_http_client(http_client)
}
