//! Error types for `ConnHub`
//!
//! Test failures are not errors: they are captured into a
//! [`ConnectionTestResult`](crate::models::ConnectionTestResult) by the tester.
//! The types here cover everything that is returned to a caller as `Err`.

use thiserror::Error;
use uuid::Uuid;

use crate::state::TransitionError;

/// A connection failed a save-time invariant check
///
/// Raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    /// Field that failed validation (wire name, e.g. `config.timeout`)
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl ValidationError {
    /// Creates a new validation error
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A required field is empty or missing
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Errors from the external persistence service
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure reaching the service
    #[error("Storage request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status
    #[error("Storage service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode storage response: {0}")]
    Decode(String),

    /// The record does not exist in storage
    #[error("Connection not found in storage: {0}")]
    NotFound(Uuid),

    /// The store cannot serve requests right now
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file
    #[error("Failed to read settings from {path}: {reason}")]
    Read {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// Failed to parse the settings file
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// A setting has an invalid value
    #[error("Invalid setting {field}: {reason}")]
    Validation {
        /// Setting name
        field: String,
        /// Reason
        reason: String,
    },

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error type returned by the connection registry
#[derive(Debug, Error)]
pub enum ConnHubError {
    /// Local validation failed; nothing was sent to storage
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operation on an unknown connection id
    #[error("Connection not found: {0}")]
    NotFound(Uuid),

    /// A test is already running for this connection
    #[error("Test already in progress for connection {0}")]
    TestInProgress(Uuid),

    /// The connection is administratively disabled
    #[error("Connection {0} is inactive")]
    Inactive(Uuid),

    /// A status transition was rejected by the state machine
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The persistence service failed; passed through as-is
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ConnHubError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl ConnHubError {
    /// Returns true for errors caused by caller input rather than the environment
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::TestInProgress(_)
                | Self::Inactive(_)
                | Self::Transition(_)
        )
    }
}

/// Result type alias for registry operations
pub type ConnHubResult<T> = std::result::Result<T, ConnHubError>;
