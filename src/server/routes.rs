//! HTTP handlers and their request/response bodies

use crate::server::error::ApiError;
use crate::server::AppState;
use crate::storage::TranscriptMessage;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Name used when an upload carries no file name
const FALLBACK_FILE_NAME: &str = "document";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default = "default_use_search")]
    pub use_search: bool,
    /// Accepted for compatibility; replies are never streamed
    #[serde(default)]
    pub stream: bool,
}

fn default_use_search() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub file_name: String,
    pub message: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<TranscriptMessage>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.agent.model_name(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.stream {
        tracing::debug!(session_id = %request.session_id, "Streaming requested, replying in one piece");
    }

    let reply = state
        .agent
        .chat(&request.session_id, &request.message, request.use_search)
        .await?;

    Ok(Json(ChatResponse {
        session_id: request.session_id,
        reply: reply.reply,
        sources: reply.sources,
    }))
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut session_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("session_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid session_id: {}", e)))?;
                session_id = Some(value);
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(FALLBACK_FILE_NAME)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let session_id = session_id.ok_or_else(|| ApiError::bad_request("Missing field: session_id"))?;
    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("Missing field: file"))?;

    let reply = state
        .agent
        .analyze_document(&session_id, &file_name, bytes)
        .await?;

    Ok(Json(UploadResponse {
        session_id,
        file_name,
        message: format!("Successfully processed {} file.", reply.kind.label()),
        summary: reply.summary,
    }))
}

pub async fn new_session(State(state): State<AppState>) -> Json<NewSessionResponse> {
    Json(NewSessionResponse {
        session_id: state.agent.new_session_id(),
    })
}

pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.agent.history(&session_id).await?;
    Ok(Json(HistoryResponse {
        total: messages.len(),
        session_id,
        messages,
    }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if state.agent.delete_session(&session_id).await? {
        Ok(Json(DeleteResponse {
            message: format!("Session '{}' cleared.", session_id),
        }))
    } else {
        Err(ApiError::not_found("Session not found."))
    }
}
