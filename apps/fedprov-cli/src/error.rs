//! CLI error types and exit codes.

use thiserror::Error;

/// Exit codes:
/// - 0: success
/// - 1: general error / one or more entries failed
/// - 2: authentication error
/// - 4: configuration or validation error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid entries file: {0}")]
    Entries(#[from] serde_yaml::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] fedprov_auth::AuthError),

    #[error("Identity platform error: {0}")]
    Identity(#[from] fedprov_identity::IdentityError),

    #[error("DevOps platform error: {0}")]
    DevOps(#[from] fedprov_devops::DevOpsError),

    #[error("{failed} of {total} entries failed")]
    EntriesFailed { failed: usize, total: usize },
}

impl CliError {
    /// Exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Entries(_) => 4,
            CliError::Auth(_) => 2,
            _ => 1,
        }
    }
}
