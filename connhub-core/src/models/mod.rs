//! Core data structures for `ConnHub`
//!
//! Connections, their configuration and credentials, test results, and
//! read-only templates.

mod connection;
mod credentials;
mod template;
mod test_result;
pub mod validation;

pub use connection::{
    Connection, ConnectionConfig, ConnectionFormData, ConnectionStatus, ConnectionType,
    ConnectionUpdate, DEFAULT_HEALTH_INTERVAL_MINUTES, DEFAULT_HEALTH_TIMEOUT_SECS,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS, DEFAULT_TIMEOUT_SECS, HealthCheckConfig,
    HttpMethod,
};
pub use credentials::{ApiKeyLocation, AuthKind, Credentials, DEFAULT_API_KEY_HEADER};
pub use template::ConnectionTemplate;
pub use test_result::ConnectionTestResult;
pub use validation::{validate_connection, validate_form, validate_update};
