//! Language-model inference contract and OpenAI-compatible client.
//!
//! The call contract is a single prompt completion: model + prompt in,
//! text + token usage out. The production client speaks the OpenAI chat
//! API, which also covers OpenRouter-style gateways via `OPENAI_API_BASE`.

use crate::error::{HenteError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Default timeout for inference requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// One completed inference call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The model's response text.
    pub text: String,
    /// Total tokens consumed, when the provider reports usage.
    pub total_tokens: Option<u32>,
}

/// Trait for the language-model inference service.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion>;
}

/// Inference client backed by an OpenAI-compatible chat completions API.
pub struct OpenAiInference {
    client: async_openai::Client<OpenAIConfig>,
}

impl OpenAiInference {
    /// Create a client with the default request timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: async_openai::Client::with_config(OpenAIConfig::default())
                .with_http_client(http_client),
        }
    }
}

impl Default for OpenAiInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Inference for OpenAiInference {
    #[instrument(skip(self, prompt))]
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| HenteError::Inference(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| HenteError::Inference(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HenteError::Inference(format!("Completion request failed: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| HenteError::Inference("Response contained no content".to_string()))?;

        let total_tokens = response.usage.map(|u| u.total_tokens);

        Ok(Completion { text, total_tokens })
    }
}
