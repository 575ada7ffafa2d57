//! Kimi provider implementation for Kimi Agent
//!
//! Talks to Moonshot's OpenAI-compatible chat completions endpoint (or any
//! other server speaking the same protocol, selected through `base_url`).

use crate::config::ModelConfig;
use crate::error::{KimiError, Result};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible chat completions provider
///
/// # Examples
///
/// ```no_run
/// use kimi_agent::config::ModelConfig;
/// use kimi_agent::providers::{KimiProvider, Message, Provider};
///
/// # async fn example() -> kimi_agent::error::Result<()> {
/// let config = ModelConfig {
///     api_key: "sk-...".to_string(),
///     ..Default::default()
/// };
/// let provider = KimiProvider::new(config)?;
/// let reply = provider.complete(&[Message::user("Hello!")], 0.7).await?;
/// # Ok(())
/// # }
/// ```
pub struct KimiProvider {
    client: Client,
    config: ModelConfig,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl KimiProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns `KimiError::MissingCredentials` when no api key is configured
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(KimiError::MissingCredentials(
                "KIMI_API_KEY is not set in environment variables".to_string(),
            )
            .into());
        }

        // Completion deadlines are enforced by the agent; this only guards
        // against a connection that never completes the handshake.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KimiError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Provider for KimiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<CompletionResponse> {
        let request = ChatCompletionRequest {
            model: &self.config.name,
            messages,
            temperature,
            stream: false,
        };

        tracing::debug!(
            "Sending completion request: model={}, {} messages",
            self.config.name,
            messages.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Kimi request failed: {}", e);
                KimiError::Provider(format!("Kimi request failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Kimi rejected credentials: {}", error_text);
            return Err(KimiError::Authentication(error_text).into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Kimi returned error {}: {}", status, error_text);
            return Err(KimiError::Provider(format!(
                "Kimi returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Kimi response: {}", e);
            KimiError::Provider(format!("Failed to parse Kimi response: {}", e))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KimiError::Provider("Kimi response contained no choices".to_string()))?;

        let mut completion = CompletionResponse {
            content: choice.message.content,
            usage: None,
        };
        if let Some(usage) = body.usage {
            tracing::debug!(
                "Kimi usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
            completion = completion.with_usage(TokenUsage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
            ));
        }

        Ok(completion)
    }

    fn model_name(&self) -> String {
        self.config.name.clone()
    }
}
