//! Error types for Kimi Agent
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Reasons a document could not be turned into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// File extension is not one of the supported document types
    #[error("Unsupported file type '{extension}'. Supported: {supported}")]
    UnsupportedType {
        /// The rejected extension (lower-cased, including the dot)
        extension: String,
        /// Comma separated list of accepted extensions
        supported: String,
    },

    /// The parser for this document type was not compiled in
    #[error("{0} extraction backend is not available in this build")]
    BackendMissing(String),

    /// The parser failed on the given bytes
    #[error("Failed to extract text: {0}")]
    Failed(String),
}

/// Main error type for Kimi Agent operations
///
/// Covers configuration, collaborator (model, search, extraction) failures,
/// session lifecycle violations, and storage problems.
#[derive(Error, Debug)]
pub enum KimiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credentials for the model backend
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Authentication errors (e.g., 401 Unauthorized)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A collaborator call exceeded its deadline
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout {
        /// What was being waited on
        operation: String,
        /// The configured deadline
        seconds: u64,
    },

    /// Web search errors
    #[error("Search error: {0}")]
    Search(String),

    /// Document extraction errors
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Session identifier is not usable as a storage key
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Session does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session was deleted while a handle to it was still held
    #[error("Session has been deleted: {0}")]
    SessionClosed(String),

    /// Transcript storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Kimi Agent operations
///
/// Uses `anyhow::Error` so callers can attach context; surfaces downcast to
/// [`KimiError`] when they need to classify a failure.
pub type Result<T> = anyhow::Result<T>;
