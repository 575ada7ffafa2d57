//! Provider module for Kimi Agent
//!
//! This module contains the model provider abstraction and the
//! OpenAI-compatible Kimi implementation.

pub mod base;
pub mod kimi;

pub use base::{CompletionResponse, Message, Provider, Role, TokenUsage};
pub use kimi::KimiProvider;

use crate::config::ModelConfig;
use crate::error::Result;

/// Create the model provider described by configuration
///
/// # Errors
///
/// Returns error if credentials are missing or the HTTP client cannot be built
pub fn create_provider(config: &ModelConfig) -> Result<Box<dyn Provider>> {
    Ok(Box::new(KimiProvider::new(config.clone())?))
}
