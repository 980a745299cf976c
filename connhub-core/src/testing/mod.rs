//! Connection testing
//!
//! [`ConnectionTester`] runs one test against one connection: it builds a
//! probe request from the connection's config and credentials, sends it
//! through a [`ProbeTransport`] under a per-attempt timeout, retries
//! transient failures, and folds every outcome into a
//! [`ConnectionTestResult`]. It never returns an error.

// Timeouts are reported in whole seconds
#![allow(clippy::cast_possible_truncation)]

mod request;
mod retry;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument};

pub use request::{TestMode, TestOverrides, build_request, classify_status, resolve_target};
pub use retry::{DEFAULT_BACKOFF_MULTIPLIER, RetryPolicy, RetryPredicate, RetryState};
pub use transport::{HttpTransport, ProbeError, ProbeRequest, ProbeResponse, ProbeTransport};

use crate::models::{Connection, ConnectionTestResult, HealthCheckConfig};

/// Message on a passing test
pub const SUCCESS_MESSAGE: &str = "Connection successful";

/// Message on a failing test
pub const FAILURE_MESSAGE: &str = "Connection test failed";

/// Runs single-connection tests
#[derive(Clone)]
pub struct ConnectionTester {
    transport: Arc<dyn ProbeTransport>,
}

impl std::fmt::Debug for ConnectionTester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTester").finish_non_exhaustive()
    }
}

impl ConnectionTester {
    /// Creates a tester over the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn ProbeTransport>) -> Self {
        Self { transport }
    }

    /// Creates a tester backed by [`HttpTransport`]
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn http(user_agent: &str) -> Result<Self, ProbeError> {
        Ok(Self::new(Arc::new(HttpTransport::new(user_agent)?)))
    }

    /// Tests a connection with its configured target and method
    pub async fn test(&self, connection: &Connection, mode: TestMode) -> ConnectionTestResult {
        self.test_with(connection, mode, &TestOverrides::default())
            .await
    }

    /// Tests a connection, optionally overriding target and method
    ///
    /// Each attempt is bounded by the timeout for `mode`. Transient failures
    /// are retried per the connection's retry settings. `responseTime`
    /// covers every attempt and the delays between them.
    #[instrument(
        skip(self, connection, overrides),
        fields(connection_id = %connection.id, mode = %mode)
    )]
    pub async fn test_with(
        &self,
        connection: &Connection,
        mode: TestMode,
        overrides: &TestOverrides,
    ) -> ConnectionTestResult {
        let request = build_request(connection, overrides);
        let timeout = mode.timeout(connection);
        let mut state = RetryState::new(RetryPolicy::from_config(&connection.config));
        let start = Instant::now();

        debug!(target_url = %request.url, method = %request.method, "Starting connection test");

        loop {
            let attempt = state.begin_attempt();
            match self
                .attempt(&request, &connection.health_check, timeout)
                .await
            {
                Ok(status) => {
                    let elapsed = start.elapsed();
                    debug!(
                        attempt,
                        status,
                        duration_ms = elapsed.as_millis() as u64,
                        "Connection test succeeded"
                    );
                    return ConnectionTestResult::success(SUCCESS_MESSAGE, elapsed)
                        .with_status_code(status)
                        .with_attempts(attempt)
                        .with_detail("target", request.url.clone());
                }
                Err(error) => {
                    if let Some(delay) = state.record_failure(&error) {
                        debug!(
                            attempt,
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying connection test"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let elapsed = start.elapsed();
                    debug!(
                        attempt,
                        error = %error,
                        transient = error.is_transient(),
                        duration_ms = elapsed.as_millis() as u64,
                        "Connection test failed"
                    );
                    let mut result = ConnectionTestResult::failure(FAILURE_MESSAGE, error.to_string())
                        .with_elapsed(elapsed)
                        .with_attempts(attempt)
                        .with_detail("target", request.url.clone());
                    if let Some(status) = error.status_code() {
                        result = result.with_status_code(status);
                    }
                    return result;
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &ProbeRequest,
        health_check: &HealthCheckConfig,
        timeout: Duration,
    ) -> Result<u16, ProbeError> {
        match tokio::time::timeout(timeout, self.transport.send(request, timeout)).await {
            Ok(Ok(response)) => classify_status(health_check, response.status).map(|()| response.status),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ProbeError::Timeout(timeout.as_secs())),
        }
    }
}
