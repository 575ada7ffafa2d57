//! Context augmentation with web search results
//!
//! Whether a turn is augmented is decided by a [`ContextAugmentationPolicy`].
//! When it is, the user's text is sent to the search collaborator and the
//! results are folded into the message the model sees.

use crate::config::default_search_triggers;
use crate::prompts::with_search_context;
use crate::tools::{SearchError, SearchProvider, SearchResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether a user message should be augmented with search results
pub trait ContextAugmentationPolicy: Send + Sync {
    /// Whether `text` should trigger a search
    fn should_augment(&self, text: &str) -> bool;
}

/// Triggers when the lower-cased text contains any configured phrase
///
/// # Examples
///
/// ```
/// use kimi_agent::agent::{ContextAugmentationPolicy, KeywordTriggerPolicy};
///
/// let policy = KeywordTriggerPolicy::default();
/// assert!(policy.should_augment("What is the weather today"));
/// assert!(!policy.should_augment("thanks, bye"));
/// ```
#[derive(Debug, Clone)]
pub struct KeywordTriggerPolicy {
    triggers: Vec<String>,
}

impl KeywordTriggerPolicy {
    /// Policy with the default trigger vocabulary
    pub fn new() -> Self {
        Self::with_triggers(default_search_triggers())
    }

    /// Policy with a custom trigger vocabulary
    ///
    /// Triggers are matched case-insensitively; blank entries are ignored.
    pub fn with_triggers<I, S>(triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: triggers
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// The active trigger phrases
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }
}

impl Default for KeywordTriggerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextAugmentationPolicy for KeywordTriggerPolicy {
    fn should_augment(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

/// A user message after augmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Augmentation {
    /// Text to store as the user message
    pub text: String,
    /// Non-empty result URLs, in ranking order
    pub sources: Vec<String>,
}

impl Augmentation {
    /// Text passed through untouched, with no sources
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

/// Search for `text` and fold the results into it
///
/// Search failures and timeouts never fail the turn: they are replaced by a
/// single placeholder result without a URL, so `sources` ends up empty.
pub async fn augment(text: &str, search: &dyn SearchProvider, timeout: Duration) -> Augmentation {
    let outcome = match tokio::time::timeout(timeout, search.search(text)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SearchError::Timeout(timeout)),
    };

    let results = match outcome {
        Ok(results) => {
            debug!(
                "{} search returned {} results",
                search.name(),
                results.len()
            );
            results
        }
        Err(e) => {
            warn!("{} search failed, continuing without results: {}", search.name(), e);
            vec![SearchResult::error(e.to_string())]
        }
    };

    let sources = results
        .iter()
        .filter(|r| !r.url.is_empty())
        .map(|r| r.url.clone())
        .collect();

    Augmentation {
        text: with_search_context(text, &results),
        sources,
    }
}
