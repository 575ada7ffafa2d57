//! Kimi Agent - session-scoped chat agent library
//!
//! This library provides the core functionality for Kimi Agent: per-session
//! conversation memory, web search augmentation, document analysis, and the
//! HTTP and CLI surfaces that drive them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Session registry, augmentation policy, and the turn orchestrator
//! - `storage`: Transcript store and its file / in-memory backends
//! - `providers`: Model provider abstraction and the Kimi implementation
//! - `tools`: Web search and document extraction collaborators
//! - `prompts`: System preamble and prompt templates
//! - `server`: axum HTTP API
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind the CLI subcommands
//!
//! # Example
//!
//! ```no_run
//! use kimi_agent::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::default();
//!     config.model.api_key = std::env::var("KIMI_API_KEY")?;
//!     let agent = Agent::from_config(&config)?;
//!
//!     let session_id = agent.new_session_id();
//!     let reply = agent.chat(&session_id, "hello", false).await?;
//!     println!("{}", reply.reply);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, ChatReply, DocumentReply};
pub use config::Config;
pub use error::{ExtractionError, KimiError, Result};

#[cfg(test)]
pub mod test_utils;
