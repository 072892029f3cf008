use std::path::PathBuf;

use thiserror::Error;

/// Errors from token persistence and the OAuth callback flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Invalid oauth state, expected {expected:?}, got {received:?}")]
    StateMismatch { expected: String, received: String },
    #[error("Authorization denied by provider: {0}")]
    AccessDenied(String),
    #[error("Code exchange failed: {0}")]
    Exchange(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Cannot resolve token path: {0}")]
    Resolution(String),
    #[error("Need client id and secret to generate a new token")]
    MissingCredentials,
    #[error("Random state generation failed: {0}")]
    Entropy(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Callback server stopped before delivering a result")]
    CallbackClosed,
    #[error("Authorization cancelled")]
    Cancelled,
    #[error("Authorization timed out after {0}ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::Configuration(error.to_string())
    }
}
