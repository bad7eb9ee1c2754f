//! Error types for modelpush.

use thiserror::Error;

/// Result type alias for modelpush operations.
pub type Result<T> = std::result::Result<T, PushError>;

/// Main error type for modelpush operations.
#[derive(Error, Debug)]
pub enum PushError {
    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Repository identifier rejected before any request was made.
    #[error("Invalid repository id '{repo_id}': {reason}")]
    InvalidRepoId {
        /// The offending identifier.
        repo_id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The token was missing or rejected by the Hub.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-success HTTP response from the Hub.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message, or the raw body.
        message: String,
    },

    /// Transport or protocol errors talking to the Hub.
    #[error("Hub error: {0}")]
    Hub(String),

    /// Non-success answer from the inference API, body kept verbatim.
    #[error("API Error: {status} - {body}")]
    Inference {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The local folder contained nothing to upload.
    #[error("No files to upload in '{0}'")]
    EmptyFolder(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PushError {
    /// Build an [`PushError::InvalidRepoId`].
    pub fn invalid_repo_id(repo_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepoId {
            repo_id: repo_id.into(),
            reason: reason.into(),
        }
    }
}
