//! Error types for SmartThings API calls.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for endpoint resolution and resource calls.
#[derive(Error, Debug)]
pub enum SmartThingsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Endpoint resolution returned no entries")]
    EmptyResponse,

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SmartThingsError {
    /// Create an API error from a non-success status and its body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Whether the failure means the stored token should be discarded.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Api { status, .. } => matches!(status, 401 | 403),
            Self::Auth(_) => true,
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SmartThingsError>;
