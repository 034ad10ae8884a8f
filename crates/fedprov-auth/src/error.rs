//! Error types for token acquisition.

use thiserror::Error;

/// Result type alias using `AuthError`.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while acquiring an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token endpoint rejected the request.
    #[error("Token request failed with status {status}: {body}")]
    TokenRequest { status: u16, body: String },

    /// The token response could not be parsed.
    #[error("Failed to parse token response: {0}")]
    TokenParse(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
