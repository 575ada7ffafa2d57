//! Test utilities for Kimi Agent
//!
//! Scripted collaborators for driving the agent without network access,
//! plus temporary directory helpers.

use crate::agent::{Agent, AgentSettings, SessionRegistry, SessionRegistryConfig};
use crate::config::Config;
use crate::error::{KimiError, Result};
use crate::providers::{CompletionResponse, Message, Provider};
use crate::storage::{InMemoryBackend, TranscriptBackend};
use crate::tools::{SearchError, SearchProvider, SearchResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!(
            "Expected error containing '{}' but got Ok({:?})",
            expected, value
        ),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration that passes validation without touching the environment
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.model.api_key = "sk-test".to_string();
    config
}

/// One scripted provider answer
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply with this text
    Text(String),
    /// Reply with no content at all
    Empty,
    /// Fail with a provider error carrying this message
    Fail(String),
}

/// A call the mock provider received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Messages sent to the model
    pub messages: Vec<Message>,
    /// Sampling temperature
    pub temperature: f32,
}

/// Provider that plays back scripted replies and records what it was sent
///
/// Once the script is exhausted it answers with the default reply.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Provider that always answers `"mock reply"`
    pub fn new() -> Self {
        Self::replying("mock reply")
    }

    /// Provider that always answers `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: MockReply::Text(text.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose every call fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Fail(message.into()),
            ..Self::new()
        }
    }

    /// Queue a reply ahead of the default
    pub fn then(self, reply: MockReply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<CompletionResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            temperature,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());
        match reply {
            MockReply::Text(text) => Ok(CompletionResponse::new(text)),
            MockReply::Empty => Ok(CompletionResponse::default()),
            MockReply::Fail(message) => Err(KimiError::Provider(message).into()),
        }
    }

    fn model_name(&self) -> String {
        "mock-model".to_string()
    }
}

/// Search collaborator with canned output that records its queries
pub struct StubSearch {
    outcome: std::result::Result<Vec<SearchResult>, SearchError>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    /// Always return `results`
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            outcome: Ok(results),
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with `error`
    pub fn failing(error: SearchError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::with_results(Vec::new())
        }
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<SearchResult>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Agent over an in-memory backend and the given collaborators
pub fn test_agent(provider: Arc<MockProvider>, search: Arc<StubSearch>) -> Agent {
    test_agent_with_backend(provider, search, Arc::new(InMemoryBackend))
}

/// Agent over `backend` and the given collaborators
pub fn test_agent_with_backend(
    provider: Arc<MockProvider>,
    search: Arc<StubSearch>,
    backend: Arc<dyn TranscriptBackend>,
) -> Agent {
    let config = test_config();
    Agent::new(
        provider,
        SessionRegistry::new(backend, SessionRegistryConfig::default()),
        search,
        AgentSettings::from(&config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(KimiError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_script() {
        let provider = MockProvider::replying("default")
            .then(MockReply::Text("first".to_string()))
            .then(MockReply::Empty)
            .then(MockReply::Fail("boom".to_string()));
        let messages = [Message::user("hi")];

        let first = provider.complete(&messages, 0.7).await.unwrap();
        assert_eq!(first.into_text(), "first");
        let second = provider.complete(&messages, 0.7).await.unwrap();
        assert!(second.content.is_none());
        assert!(provider.complete(&messages, 0.7).await.is_err());
        let fourth = provider.complete(&messages, 0.3).await.unwrap();
        assert_eq!(fourth.into_text(), "default");

        let calls = provider.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].temperature, 0.3);
        assert_eq!(calls[0].messages, messages.to_vec());
    }

    #[tokio::test]
    async fn test_stub_search_records_queries() {
        let search = StubSearch::failing(SearchError::Api("quota".to_string()));
        assert!(search.search("q1").await.is_err());
        assert_eq!(search.queries(), vec!["q1".to_string()]);
    }
}
