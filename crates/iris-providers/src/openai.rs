//! OpenAI-compatible chat-completion provider.
//!
//! Works with OpenAI's API and any compatible endpoint. Every request
//! carries the full conversation history plus the configured sampling
//! parameters, and is bounded by the configured timeout.

use async_trait::async_trait;
use iris_core::{
    config::CompletionConfig,
    context::{ApiMessage, Context},
    error::IrisError,
    message::{Completion, MessageMetadata},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(config: CompletionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

/// Build wire-format messages from the context's API messages.
pub(crate) fn build_messages(api_messages: &[ApiMessage]) -> Vec<ChatMessage> {
    api_messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect()
}

/// Extract the completion text, or `None` when the payload is malformed.
pub(crate) fn completion_text(response: &ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.message.as_ref())
        .map(|m| m.content.clone())
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, context: &Context) -> Result<Completion, IrisError> {
        let start = Instant::now();
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(&context.api_messages()),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!("openai: POST {url} model={}", self.config.model);

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| IrisError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IrisError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| IrisError::Provider(format!("openai: failed to parse response: {e}")))?;

        // A 2xx body with no completion text is still a failure.
        let text = completion_text(&parsed)
            .ok_or_else(|| IrisError::Provider("openai: response has no completion".into()))?;

        let tokens = parsed.usage.as_ref().and_then(|u| u.total_tokens);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        Ok(Completion {
            text,
            metadata: MessageMetadata {
                provider_used: "openai".to_string(),
                tokens_used: tokens,
                processing_time_ms: elapsed_ms,
                model: parsed.model,
            },
        })
    }

    async fn is_available(&self) -> bool {
        if self.config.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        // Basic check: try to list models.
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .timeout(self.timeout())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
