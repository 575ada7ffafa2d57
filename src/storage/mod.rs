//! Transcript storage for Kimi Agent
//!
//! A [`TranscriptStore`] holds the ordered messages of one session and
//! writes them through to a [`TranscriptBackend`] on every append. The file
//! backend keeps one JSON document per session and rewrites it in full on
//! each change; transcripts are small enough that this stays cheap.

use crate::error::{KimiError, Result};
use crate::providers::{Message, Role};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod types;
pub use types::{parse_timestamp, TranscriptMessage};

/// Longest session id accepted as a storage key
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Check that a session id is safe to use as a file stem
///
/// Ids are limited to ASCII letters, digits, `-` and `_`.
///
/// # Examples
///
/// ```
/// use kimi_agent::storage::validate_session_id;
///
/// assert!(validate_session_id("3f2b8c1e-aaaa-4bbb-8ccc-0123456789ab").is_ok());
/// assert!(validate_session_id("../etc/passwd").is_err());
/// ```
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KimiError::InvalidSessionId(session_id.to_string()).into())
    }
}

/// Durable home of session transcripts
#[async_trait]
pub trait TranscriptBackend: Send + Sync {
    /// Load the transcript for a session; empty if nothing is stored
    async fn load(&self, session_id: &str) -> Result<Vec<TranscriptMessage>>;

    /// Replace the stored transcript with `messages`
    async fn save(&self, session_id: &str, messages: &[TranscriptMessage]) -> Result<()>;

    /// Remove the stored transcript, returning whether one existed
    async fn erase(&self, session_id: &str) -> Result<bool>;

    /// Whether a transcript is stored for the session
    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Short human readable description for logs
    fn describe(&self) -> String;

    /// Whether transcripts survive the process
    fn is_durable(&self) -> bool {
        false
    }
}

/// One pretty-printed JSON file per session
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `KimiError::Storage` if the directory cannot be created
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            KimiError::Storage(format!(
                "Failed to create memory directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the transcript files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the transcript file for a session
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl TranscriptBackend for JsonFileBackend {
    async fn load(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let path = self.path_for(session_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(KimiError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
                .into())
            }
        };

        let messages: Vec<TranscriptMessage> = serde_json::from_str(&contents).map_err(|e| {
            KimiError::Storage(format!("Corrupt transcript {}: {}", path.display(), e))
        })?;
        tracing::debug!(
            session_id,
            count = messages.len(),
            "Loaded transcript from {}",
            path.display()
        );
        Ok(messages)
    }

    async fn save(&self, session_id: &str, messages: &[TranscriptMessage]) -> Result<()> {
        let path = self.path_for(session_id);
        let tmp = self.dir.join(format!("{}.json.tmp", session_id));
        let json = serde_json::to_string_pretty(messages)
            .map_err(|e| KimiError::Storage(format!("Serialization failed: {}", e)))?;

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            KimiError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            KimiError::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    async fn erase(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(session_id, "Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KimiError::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))
            .into()),
        }
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id);
        tokio::fs::try_exists(&path).await.map_err(|e| {
            KimiError::Storage(format!("Failed to stat {}: {}", path.display(), e)).into()
        })
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.dir.display())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// Backend that keeps nothing; transcripts live only in process memory
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

#[async_trait]
impl TranscriptBackend for InMemoryBackend {
    async fn load(&self, _session_id: &str) -> Result<Vec<TranscriptMessage>> {
        Ok(Vec::new())
    }

    async fn save(&self, _session_id: &str, _messages: &[TranscriptMessage]) -> Result<()> {
        Ok(())
    }

    async fn erase(&self, _session_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn exists(&self, _session_id: &str) -> Result<bool> {
        Ok(false)
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// Build the backend selected in configuration
pub fn create_backend(config: &crate::config::StorageConfig) -> Result<Arc<dyn TranscriptBackend>> {
    match config.backend {
        crate::config::StorageBackendKind::File => Ok(Arc::new(JsonFileBackend::new(&config.dir)?)),
        crate::config::StorageBackendKind::Memory => Ok(Arc::new(InMemoryBackend)),
    }
}

/// Ordered message history of a single session
///
/// Every mutation is written through to the backend before it returns.
/// Callers that share a store across tasks must serialise access (the
/// session registry wraps each store in a mutex).
pub struct TranscriptStore {
    session_id: String,
    messages: Vec<TranscriptMessage>,
    backend: Arc<dyn TranscriptBackend>,
}

impl std::fmt::Debug for TranscriptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptStore")
            .field("session_id", &self.session_id)
            .field("messages", &self.messages.len())
            .field("backend", &self.backend.describe())
            .finish()
    }
}

impl TranscriptStore {
    /// Open the store for a session, loading any persisted transcript
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the backend cannot be read
    pub async fn open(
        session_id: impl Into<String>,
        backend: Arc<dyn TranscriptBackend>,
    ) -> Result<Self> {
        let session_id = session_id.into();
        validate_session_id(&session_id)?;
        let messages = backend.load(&session_id).await?;
        Ok(Self {
            session_id,
            messages,
            backend,
        })
    }

    /// Create a store that never persists anything
    pub fn in_memory(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            backend: Arc::new(InMemoryBackend),
        }
    }

    /// Session this transcript belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a message stamped with the current time and persist
    ///
    /// A `system` message is only accepted into an empty transcript. If the
    /// backend write fails the message is dropped again so memory never
    /// runs ahead of storage.
    ///
    /// # Errors
    ///
    /// Returns `KimiError::Storage` on an out-of-place system message or a
    /// failed write
    pub async fn append(&mut self, role: Role, content: impl Into<String>) -> Result<()> {
        if role == Role::System && !self.messages.is_empty() {
            return Err(KimiError::Storage(format!(
                "system message must be the first entry of session {}",
                self.session_id
            ))
            .into());
        }

        self.messages.push(TranscriptMessage::now(role, content));
        if let Err(e) = self.backend.save(&self.session_id, &self.messages).await {
            self.messages.pop();
            return Err(e);
        }
        Ok(())
    }

    /// All messages with their timestamps, oldest first
    pub fn read_all(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    /// Messages reduced to what the model receives
    pub fn read_for_model(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(TranscriptMessage::to_model_message)
            .collect()
    }

    /// Number of messages held
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message and the persisted artifact
    ///
    /// Clearing an empty or never-persisted transcript is not an error.
    /// Returns whether a persisted artifact was removed.
    pub async fn clear(&mut self) -> Result<bool> {
        self.messages.clear();
        self.backend.erase(&self.session_id).await
    }
}
