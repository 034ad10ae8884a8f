//! Error types for the Azure DevOps client.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using `DevOpsError`.
pub type DevOpsResult<T> = Result<T, DevOpsError>;

/// Errors that can occur when talking to the Azure DevOps REST API.
#[derive(Debug, Error)]
pub enum DevOpsError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition error.
    #[error("Authentication error: {0}")]
    Auth(#[from] fedprov_auth::AuthError),

    /// Error response from the DevOps REST API.
    #[error("DevOps API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Project does not exist. No recovery path: provisioning cannot
    /// proceed without it.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
}

/// Error body returned by the DevOps REST API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl DevOpsError {
    /// Maps a non-success response body to a [`DevOpsError::Api`].
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.message)
            .unwrap_or_else(|_| body.to_string());

        DevOpsError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
