//! Base provider trait and common types for Kimi Agent
//!
//! This module defines the Provider trait that model backends implement,
//! along with the role and message types exchanged with them. The agent
//! never offers tools to the model: a completion takes plain text in and
//! returns plain text out.

use crate::error::{KimiError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed preamble that frames the conversation
    System,
    /// Text supplied by the person chatting
    User,
    /// Text produced by the model
    Assistant,
}

impl Role {
    /// Lower-case wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = KimiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(KimiError::Provider(format!("Unknown role: {}", other))),
        }
    }
}

/// Message structure sent to the model
///
/// Only role and content travel to the provider; timestamps stay in the
/// transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new message with the given role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use kimi_agent::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use kimi_agent::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from a completion call
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Generated text; backends may legitimately return no content
    pub content: Option<String>,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a response carrying text only
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
        }
    }

    /// Attach token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// The reply text, with absent content mapped to an empty string
    ///
    /// # Examples
    ///
    /// ```
    /// use kimi_agent::providers::CompletionResponse;
    ///
    /// assert_eq!(CompletionResponse::default().into_text(), "");
    /// assert_eq!(CompletionResponse::new("hi").into_text(), "hi");
    /// ```
    pub fn into_text(self) -> String {
        self.content.unwrap_or_default()
    }
}

/// Provider trait for model backends
///
/// The model collaborator is an opaque function from an ordered transcript
/// to a generated reply. Implementations must be cheap to share across
/// concurrent turns.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation with the given messages
    ///
    /// # Arguments
    ///
    /// * `messages` - Full conversation history, oldest first
    /// * `temperature` - Sampling temperature for this call
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn complete(&self, messages: &[Message], temperature: f32)
        -> Result<CompletionResponse>;

    /// Name of the model this provider talks to
    fn model_name(&self) -> String {
        "unknown".to_string()
    }
}
