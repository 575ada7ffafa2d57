//! Agent core implementation
//!
//! The [`Agent`] runs one turn at a time per session:
//! - resolves and locks the session through the registry
//! - seeds the system preamble on the first turn
//! - optionally augments the user's text with web search results
//! - calls the model provider under a deadline and records its reply

use crate::config::Config;
use crate::error::{ExtractionError, KimiError, Result};
use crate::prompts::{self, SYSTEM_PROMPT};
use crate::providers::{create_provider, Provider, Role};
use crate::storage::{create_backend, validate_session_id, TranscriptMessage, TranscriptStore};
use crate::tools::{
    create_search_provider, DocumentExtractor, DocumentKind, FileReader, SearchProvider,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::augmentation::{augment, Augmentation, ContextAugmentationPolicy, KeywordTriggerPolicy};
use super::registry::{SessionRegistry, SessionRegistryConfig};

/// Deadlines and sampling parameters used by the agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    /// Deadline for one model completion
    pub model_timeout: Duration,
    /// Deadline for one search call
    pub search_timeout: Duration,
    /// Temperature for chat turns
    pub chat_temperature: f32,
    /// Temperature for document summaries
    pub document_temperature: f32,
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            model_timeout: Duration::from_secs(config.model.timeout_seconds),
            search_timeout: Duration::from_secs(config.search.timeout_seconds),
            chat_temperature: config.model.chat_temperature,
            document_temperature: config.model.document_temperature,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Outcome of a chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// Assistant reply text
    pub reply: String,
    /// URLs of the search results folded into the turn
    pub sources: Vec<String>,
}

/// Outcome of a document upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReply {
    /// Assistant summary of the document
    pub summary: String,
    /// Detected document kind
    pub kind: DocumentKind,
}

/// The conversational agent
///
/// Owns the session registry and the collaborators; both HTTP and CLI
/// surfaces drive it through the same methods.
///
/// # Examples
///
/// ```no_run
/// use kimi_agent::agent::Agent;
/// use kimi_agent::config::Config;
///
/// # async fn example() -> kimi_agent::error::Result<()> {
/// let mut config = Config::default();
/// config.model.api_key = "sk-...".to_string();
///
/// let agent = Agent::from_config(&config)?;
/// let session_id = agent.new_session_id();
/// let reply = agent.chat(&session_id, "What is the latest Rust release?", true).await?;
/// println!("{} (sources: {:?})", reply.reply, reply.sources);
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: SessionRegistry,
    search: Arc<dyn SearchProvider>,
    policy: Arc<dyn ContextAugmentationPolicy>,
    extractor: Arc<dyn DocumentExtractor>,
    settings: AgentSettings,
}

impl Agent {
    /// Creates an agent from its collaborators
    ///
    /// Uses the default keyword trigger policy and a [`FileReader`] with the
    /// default character limit; see [`Agent::with_policy`] and
    /// [`Agent::with_extractor`] to replace them.
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: SessionRegistry,
        search: Arc<dyn SearchProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            provider,
            registry,
            search,
            policy: Arc::new(KeywordTriggerPolicy::default()),
            extractor: Arc::new(FileReader::default()),
            settings,
        }
    }

    /// Creates an agent wired from configuration
    ///
    /// # Errors
    ///
    /// Returns `KimiError::MissingCredentials` when no API key is configured,
    /// or any error raised while building the storage backend or clients
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.model)?);
        let backend = create_backend(&config.storage)?;
        info!("Transcript storage: {}", backend.describe());
        let registry = SessionRegistry::new(backend, SessionRegistryConfig::from(&config.sessions));
        let search = create_search_provider(&config.search)?;
        info!("Search backend: {}", search.name());

        Ok(Self::new(provider, registry, search, AgentSettings::from(config))
            .with_policy(KeywordTriggerPolicy::with_triggers(
                config.search.triggers.iter().cloned(),
            ))
            .with_extractor(FileReader::new(config.documents.max_chars)))
    }

    /// Replace the augmentation policy
    pub fn with_policy(mut self, policy: impl ContextAugmentationPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Replace the document extractor
    pub fn with_extractor(mut self, extractor: impl DocumentExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Model identifier reported by the provider
    pub fn model_name(&self) -> String {
        self.provider.model_name()
    }

    /// The session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Runs one chat turn
    ///
    /// Turns on the same session are strictly ordered. When `use_search` is
    /// set and the policy triggers, the stored user message carries the
    /// search results and their URLs are returned as sources.
    ///
    /// # Errors
    ///
    /// - `KimiError::InvalidSessionId` for a malformed id
    /// - `KimiError::SessionClosed` if the session is deleted mid-flight
    /// - `KimiError::Provider` / `KimiError::Timeout` if the model call fails;
    ///   the user message stays in the transcript
    /// - `KimiError::Storage` if the transcript cannot be persisted
    pub async fn chat(&self, session_id: &str, text: &str, use_search: bool) -> Result<ChatReply> {
        let started = Instant::now();
        info!(session_id, use_search, "Chat turn started");

        let session = self.registry.get(session_id).await?;
        let mut store = session.lock().await?;
        self.ensure_system_prompt(&mut store).await?;

        let augmentation = if use_search && self.policy.should_augment(text) {
            debug!(session_id, "Search triggered for turn");
            augment(text, self.search.as_ref(), self.settings.search_timeout).await
        } else {
            debug!(session_id, use_search, "Search not triggered for turn");
            Augmentation::unchanged(text)
        };

        store.append(Role::User, augmentation.text).await?;
        let reply = self
            .complete(&store, self.settings.chat_temperature)
            .await?;
        store.append(Role::Assistant, reply.clone()).await?;

        info!(
            session_id,
            messages = store.count(),
            sources = augmentation.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat turn completed"
        );

        Ok(ChatReply {
            reply,
            sources: augmentation.sources,
        })
    }

    /// Extracts an uploaded document and asks the model to summarise it
    ///
    /// The summary request and reply are recorded in the session like any
    /// other turn. No search is performed.
    ///
    /// # Errors
    ///
    /// - `KimiError::Extraction` if the type is unsupported or parsing fails
    /// - the same model and storage errors as [`Agent::chat`]
    pub async fn analyze_document(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentReply> {
        validate_session_id(session_id)?;
        info!(session_id, file_name, size = bytes.len(), "Document received");

        let extractor = Arc::clone(&self.extractor);
        let name = file_name.to_string();
        let document = tokio::task::spawn_blocking(move || extractor.extract(&name, &bytes))
            .await
            .map_err(|e| {
                KimiError::Extraction(ExtractionError::Failed(format!(
                    "extraction task failed: {}",
                    e
                )))
            })?
            .map_err(KimiError::from)?;

        let session = self.registry.get(session_id).await?;
        let mut store = session.lock().await?;
        self.ensure_system_prompt(&mut store).await?;

        store
            .append(
                Role::User,
                prompts::summarize_prompt(&document.text, file_name),
            )
            .await?;
        let summary = self
            .complete(&store, self.settings.document_temperature)
            .await?;
        store.append(Role::Assistant, summary.clone()).await?;

        info!(session_id, kind = %document.kind, "Document summarised");

        Ok(DocumentReply {
            summary,
            kind: document.kind,
        })
    }

    /// Full transcript of a session, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the transcript cannot be loaded
    pub async fn history(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let session = self.registry.get(session_id).await?;
        let store = session.lock().await?;
        Ok(store.read_all().to_vec())
    }

    /// Deletes a session, returning `false` if it did not exist
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the transcript cannot be erased
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        self.registry.delete(session_id).await
    }

    /// Generates a fresh session id
    pub fn new_session_id(&self) -> String {
        self.registry.new_id()
    }

    async fn ensure_system_prompt(&self, store: &mut TranscriptStore) -> Result<()> {
        if store.is_empty() {
            debug!(session_id = store.session_id(), "Seeding system prompt");
            store.append(Role::System, SYSTEM_PROMPT).await?;
        }
        Ok(())
    }

    async fn complete(&self, store: &TranscriptStore, temperature: f32) -> Result<String> {
        let messages = store.read_for_model();
        debug!(
            session_id = store.session_id(),
            count = messages.len(),
            "Requesting completion"
        );

        let timeout = self.settings.model_timeout;
        match tokio::time::timeout(timeout, self.provider.complete(&messages, temperature)).await {
            Ok(Ok(response)) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Completion usage"
                    );
                }
                Ok(response.into_text())
            }
            Ok(Err(e)) => {
                error!(session_id = store.session_id(), "Model call failed: {:#}", e);
                Err(e)
            }
            Err(_) => {
                error!(
                    session_id = store.session_id(),
                    "Model call exceeded {:?}", timeout
                );
                Err(KimiError::Timeout {
                    operation: "model completion".to_string(),
                    seconds: timeout.as_secs(),
                }
                .into())
            }
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.provider.model_name())
            .field("search", &self.search.name())
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}
