//! Configuration management for Kimi Agent
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{KimiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Kimi Agent
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model backend configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Transcript storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Session registry configuration
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Document intake configuration
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// OpenAI-compatible model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key for the backend (usually supplied via `KIMI_API_KEY`)
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Base URL of the chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Deadline for a single completion call (seconds)
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,

    /// Sampling temperature for chat turns
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,

    /// Sampling temperature for document summaries
    #[serde(default = "default_document_temperature")]
    pub document_temperature: f32,
}

fn default_base_url() -> String {
    "https://api.moonshot.cn/v1".to_string()
}

fn default_model_name() -> String {
    "moonshot-v1-8k".to_string()
}

fn default_model_timeout() -> u64 {
    120
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_document_temperature() -> f32 {
    0.3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            name: default_model_name(),
            timeout_seconds: default_model_timeout(),
            chat_temperature: default_chat_temperature(),
            document_temperature: default_document_temperature(),
        }
    }
}

/// Which transcript backend to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    /// One JSON file per session
    #[default]
    File,
    /// Process memory only, nothing survives a restart
    Memory,
}

impl std::str::FromStr for StorageBackendKind {
    type Err = KimiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(KimiError::Config(format!(
                "Unknown storage backend: {} (expected 'file' or 'memory')",
                other
            ))),
        }
    }
}

/// Transcript storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Directory holding per-session transcript files
    #[serde(default = "default_memory_dir")]
    pub dir: PathBuf,
}

fn default_memory_dir() -> PathBuf {
    PathBuf::from("./data/memory")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            dir: default_memory_dir(),
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SerpAPI key; when set SerpAPI is used instead of DuckDuckGo
    #[serde(default, skip_serializing)]
    pub serpapi_key: Option<String>,

    /// Optional endpoint override (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Maximum number of results folded into a turn
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Deadline for a single search call (seconds)
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,

    /// Lower-case substrings that trigger a search
    #[serde(default = "default_search_triggers")]
    pub triggers: Vec<String>,
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    15
}

/// Default trigger vocabulary for search augmentation
pub fn default_search_triggers() -> Vec<String> {
    [
        "what is", "who is", "latest", "recent", "news", "current", "today", "price", "weather",
        "?",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            api_base: None,
            max_results: default_max_results(),
            timeout_seconds: default_search_timeout(),
            triggers: default_search_triggers(),
        }
    }
}

/// Session registry configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    /// Maximum number of live sessions kept in memory (None = unbounded)
    #[serde(default)]
    pub max_sessions: Option<usize>,
}

/// Document intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Extracted text is cut to this many characters
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    50_000
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KimiError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| KimiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("KIMI_API_KEY") {
            self.model.api_key = api_key;
        }

        if let Some(base_url) = lookup("KIMI_BASE_URL") {
            self.model.base_url = base_url;
        }

        if let Some(model) = lookup("KIMI_MODEL") {
            self.model.name = model;
        }

        if let Some(timeout) = lookup("KIMI_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(value) => self.model.timeout_seconds = value,
                Err(_) => tracing::warn!("Invalid KIMI_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Some(backend) = lookup("MEMORY_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.storage.backend = kind,
                Err(e) => tracing::warn!("{}, keeping {:?}", e, self.storage.backend),
            }
        }

        if let Some(dir) = lookup("MEMORY_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }

        if let Some(key) = lookup("SERPAPI_KEY") {
            if !key.trim().is_empty() {
                self.search.serpapi_key = Some(key);
            }
        }

        if let Some(max) = lookup("KIMI_MAX_SESSIONS") {
            match max.parse::<usize>() {
                Ok(value) => {
                    self.sessions.max_sessions = Some(value);
                    tracing::debug!(max_sessions = value, "Env override: KIMI_MAX_SESSIONS");
                }
                Err(_) => tracing::warn!("Invalid KIMI_MAX_SESSIONS: {}", max),
            }
        }

        if let Some(bind) = lookup("KIMI_BIND") {
            self.server.bind = bind;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(dir) = &cli.memory_dir {
            self.storage.dir = dir.clone();
        }
    }

    /// Validate the configuration
    ///
    /// A missing API key is fatal: the agent must not be constructed
    /// without credentials for its model backend.
    ///
    /// # Errors
    ///
    /// Returns error if any value is missing or out of range
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.trim().is_empty() {
            return Err(KimiError::MissingCredentials(
                "KIMI_API_KEY is not set in environment variables".to_string(),
            )
            .into());
        }

        if self.model.name.trim().is_empty() {
            return Err(KimiError::Config("model.name cannot be empty".to_string()).into());
        }

        if self.model.base_url.trim().is_empty() {
            return Err(KimiError::Config("model.base_url cannot be empty".to_string()).into());
        }

        for (field, value) in [
            ("model.chat_temperature", self.model.chat_temperature),
            ("model.document_temperature", self.model.document_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(KimiError::Config(format!(
                    "{} must be between 0.0 and 2.0, got {}",
                    field, value
                ))
                .into());
            }
        }

        if self.model.timeout_seconds == 0 {
            return Err(KimiError::Config(
                "model.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.search.timeout_seconds == 0 {
            return Err(KimiError::Config(
                "search.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.search.max_results == 0 {
            return Err(
                KimiError::Config("search.max_results must be greater than 0".to_string()).into(),
            );
        }

        if self.documents.max_chars == 0 {
            return Err(
                KimiError::Config("documents.max_chars must be greater than 0".to_string()).into(),
            );
        }

        if self.sessions.max_sessions == Some(0) {
            return Err(KimiError::Config(
                "sessions.max_sessions must be greater than 0 when set".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.model.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(config.model.name, "moonshot-v1-8k");
        assert_eq!(config.storage.backend, StorageBackendKind::File);
        assert_eq!(config.storage.dir, PathBuf::from("./data/memory"));
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.documents.max_chars, 50_000);
        assert!(config.sessions.max_sessions.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KimiError>(),
            Some(KimiError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_config_validation_temperature_out_of_range() {
        let mut config = valid_config();
        config.model.chat_temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = valid_config();
        config.model.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_max_sessions() {
        let mut config = valid_config();
        config.sessions.max_sessions = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
model:
  name: moonshot-v1-32k
  timeout_seconds: 60
storage:
  backend: memory
search:
  max_results: 3
  triggers: ["forecast"]
sessions:
  max_sessions: 100
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.model.name, "moonshot-v1-32k");
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.model.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.triggers, vec!["forecast".to_string()]);
        assert_eq!(config.sessions.max_sessions, Some(100));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = valid_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-test"));
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("KIMI_API_KEY", "sk-env"),
            ("KIMI_MODEL", "moonshot-v1-128k"),
            ("MEMORY_BACKEND", "memory"),
            ("MEMORY_DIR", "/tmp/kimi"),
            ("SERPAPI_KEY", "serp"),
            ("KIMI_MAX_SESSIONS", "10"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model.api_key, "sk-env");
        assert_eq!(config.model.name, "moonshot-v1-128k");
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/kimi"));
        assert_eq!(config.search.serpapi_key.as_deref(), Some("serp"));
        assert_eq!(config.sessions.max_sessions, Some(10));
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("MEMORY_BACKEND", "redis"),
            ("KIMI_TIMEOUT_SECONDS", "soon"),
            ("SERPAPI_KEY", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.storage.backend, StorageBackendKind::File);
        assert_eq!(config.model.timeout_seconds, 120);
        assert!(config.search.serpapi_key.is_none());
    }

    #[test]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("/nonexistent/kimi/config.yaml", &cli).unwrap();
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_default_triggers() {
        let triggers = default_search_triggers();
        assert_eq!(triggers.len(), 10);
        assert!(triggers.contains(&"?".to_string()));
    }
}
