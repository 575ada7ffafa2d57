use crate::commands::build_agent;
use crate::config::Config;
use crate::error::{KimiError, Result};
use crate::providers::Role;
use crate::storage::TranscriptMessage;
use colored::Colorize;

/// Print the transcript of a session
pub async fn show_history(config: Config, session: String, json: bool) -> Result<()> {
    let agent = build_agent(&config)?;
    let messages = agent.history(&session).await?;

    if json {
        println!("{}", render_json(&session, &messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("{}", format!("No messages in session {}.", session).yellow());
        return Ok(());
    }
    for message in &messages {
        println!("{}", render_message(message));
    }
    println!();
    println!("{} message(s)", messages.len());
    Ok(())
}

/// Delete a session; a missing session is an error so the exit code reflects it
pub async fn delete_session(config: Config, session: String) -> Result<()> {
    let agent = build_agent(&config)?;
    if !agent.delete_session(&session).await? {
        return Err(KimiError::SessionNotFound(session).into());
    }
    println!("{}", format!("Session '{}' cleared.", session).green());
    Ok(())
}

/// Print a fresh session id
///
/// Needs no model credentials, so configuration is not validated here.
pub fn new_session() -> Result<()> {
    println!("{}", uuid::Uuid::new_v4());
    Ok(())
}

fn render_json(session: &str, messages: &[TranscriptMessage]) -> Result<String> {
    let body = serde_json::json!({
        "session_id": session,
        "messages": messages,
        "total": messages.len(),
    });
    Ok(serde_json::to_string_pretty(&body)?)
}

fn render_message(message: &TranscriptMessage) -> String {
    let role = match message.role {
        Role::System => "system".dimmed(),
        Role::User => "user".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
    };
    format!(
        "[{}] {}: {}",
        message.timestamp.format("%Y-%m-%d %H:%M:%S"),
        role,
        message.content
    )
}
