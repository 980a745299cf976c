//! `ConnHub` Core Library
//!
//! Connection management for third-party integrations: CRUD against an
//! external persistence service, HTTP connectivity tests with timeouts and
//! retries, a connection status state machine, bounded-concurrency bulk
//! health checks, and dashboard statistics.
//!
//! # Crate Structure
//!
//! - [`models`] - Connections, credentials, templates, test results, validation
//! - [`state`] - Status transitions driven by test lifecycle events
//! - [`testing`] - Single-connection tester with retry and timeout handling
//! - [`health`] - Bulk tests in bounded batches
//! - [`registry`] - Façade tying storage, testing and state together
//! - [`store`] - Persistence trait with REST and in-memory backends
//! - [`stats`] / [`history`] - Dashboard aggregates and recent results
//! - [`template`] - Built-in template catalog
//! - [`config`] / [`tracing`] - Settings and logging setup

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod health;
pub mod history;
pub mod models;
pub mod registry;
pub mod state;
pub mod stats;
pub mod store;
pub mod template;
pub mod testing;
pub mod tracing;

pub use config::{ClientContext, ConfigManager, CoreSettings};
pub use error::{
    ConfigError, ConfigResult, ConnHubError, ConnHubResult, StoreError, StoreResult,
    ValidationError,
};
pub use health::{BulkHealthChecker, BulkTestReport};
pub use models::{
    AuthKind, Connection, ConnectionConfig, ConnectionFormData, ConnectionStatus,
    ConnectionTemplate, ConnectionTestResult, ConnectionType, ConnectionUpdate, Credentials,
    HealthCheckConfig, HttpMethod,
};
pub use registry::ConnectionRegistry;
pub use state::{StatusEvent, TransitionError};
pub use stats::DashboardStats;
pub use store::{
    ConnectionPage, ConnectionQuery, ConnectionStore, HttpConnectionStore, MemoryConnectionStore,
};
pub use testing::{ConnectionTester, HttpTransport, ProbeTransport, TestMode, TestOverrides};
pub use tracing::{TracingConfig, TracingLevel, init_tracing};
