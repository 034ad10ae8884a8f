//! Error types for the identity-platform clients.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using `IdentityError`.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur while provisioning against Entra ID / ARM.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition error.
    #[error("Authentication error: {0}")]
    Auth(#[from] fedprov_auth::AuthError),

    /// Structured error returned by Microsoft Graph or ARM.
    #[error("API error: {code} - {message}")]
    Api { code: String, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),
}

/// Error envelope shared by Microsoft Graph (OData) and ARM responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Error body of an [`ErrorEnvelope`].
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IdentityError {
    /// Maps a non-success response body to an [`IdentityError::Api`].
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return IdentityError::Api {
                code: envelope.error.code,
                message: envelope.error.message,
            };
        }
        IdentityError::Api {
            code: status.to_string(),
            message: body.to_string(),
        }
    }
}
