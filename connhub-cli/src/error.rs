//! CLI error types and exit codes.

use connhub_core::error::{ConfigError, ConnHubError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, storage or other
    /// non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - a test failed or the connection does not exist
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid connection input, reported before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Connection test failed or could not run
    #[error("Connection test failed: {0}")]
    TestFailed(String),

    /// Template not found
    #[error("Template not found: {0}")]
    Template(String),

    /// Persistence service error
    #[error("Storage error: {0}")]
    Store(String),

    /// Output could not be rendered
    #[error("Output error: {0}")]
    Output(String),
}

impl From<ConnHubError> for CliError {
    fn from(err: ConnHubError) -> Self {
        match err {
            ConnHubError::Validation(e) => Self::Validation(e.to_string()),
            ConnHubError::NotFound(id) => Self::ConnectionNotFound(id.to_string()),
            ConnHubError::TestInProgress(_) | ConnHubError::Inactive(_) => {
                Self::TestFailed(err.to_string())
            }
            ConnHubError::Transition(e) => Self::Validation(e.to_string()),
            ConnHubError::Store(e) => Self::Store(e.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, storage, output)
    /// - 2: Connection failure (test failed, connection not found)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TestFailed(_) | Self::ConnectionNotFound(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_)
            | Self::Validation(_)
            | Self::Template(_)
            | Self::Store(_)
            | Self::Output(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
