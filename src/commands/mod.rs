/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `serve`   — Run the HTTP API
- `chat`    — Send one message to a session
- `upload`  — Summarise a document into a session
- `history` — Inspect, delete, and create sessions

Each handler builds an `Agent` from configuration and drives it through the
same methods the HTTP surface uses.
*/

use crate::agent::Agent;
use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

pub mod history;

/// Build the agent for a CLI command
///
/// # Errors
///
/// Returns error if configuration is invalid or a collaborator cannot be built
pub fn build_agent(config: &Config) -> Result<Agent> {
    Agent::from_config(config)
}

// HTTP server command handler
pub mod serve {
    //! Runs the axum server until interrupted.

    use super::*;

    /// Start the HTTP API
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `bind` - Optional address overriding `server.bind`
    ///
    /// # Errors
    ///
    /// Returns error if the agent cannot be built or the address cannot be bound
    pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
        let addr = bind.unwrap_or_else(|| config.server.bind.clone());
        let agent = Arc::new(build_agent(&config)?);
        tracing::info!(model = %agent.model_name(), "Starting Kimi Agent API");
        crate::server::serve(agent, &addr).await
    }
}

// Single-turn chat command handler
pub mod chat {
    //! Sends one message and prints the reply with its sources.

    use super::*;
    use colored::Colorize;

    /// Run one chat turn from the terminal
    ///
    /// A new session is created when `session` is `None`; its id is printed
    /// so the conversation can be continued.
    ///
    /// # Errors
    ///
    /// Returns error if the turn fails
    pub async fn run_chat(
        config: Config,
        session: Option<String>,
        message: String,
        use_search: bool,
    ) -> Result<()> {
        let agent = build_agent(&config)?;
        let session_id = match session {
            Some(id) => id,
            None => {
                let id = agent.new_session_id();
                eprintln!("{} {}", "Session:".bold(), id.cyan());
                id
            }
        };

        let reply = agent.chat(&session_id, &message, use_search).await?;
        println!("{}", reply.reply);

        if !reply.sources.is_empty() {
            println!();
            println!("{}", "Sources:".bold());
            for source in &reply.sources {
                println!("  - {}", source.blue());
            }
        }
        Ok(())
    }
}

// Document upload command handler
pub mod upload {
    //! Reads a local document and prints the agent's summary.

    use super::*;
    use crate::error::KimiError;
    use colored::Colorize;
    use std::path::Path;

    /// Summarise a local file into a session
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, has an unsupported type, or
    /// the model call fails
    pub async fn run_upload(config: Config, session: String, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            KimiError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let agent = build_agent(&config)?;
        let reply = agent.analyze_document(&session, &file_name, bytes).await?;

        println!(
            "{}",
            format!("Successfully processed {} file.", reply.kind.label()).green()
        );
        println!();
        println!("{}", reply.summary);
        Ok(())
    }
}
