//! Outcome of a single connection test.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of testing one connection
///
/// Produced once per test invocation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    /// Whether the test passed
    pub success: bool,
    /// Summary message
    pub message: String,
    /// Error description (failures only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock seconds from first attempt start to final attempt end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// When the result was produced
    pub timestamp: DateTime<Utc>,
    /// Status code of the final attempt, if a response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Attempts made, including the first
    #[serde(default)]
    pub attempts: u32,
    /// Additional details
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ConnectionTestResult {
    /// Creates a successful result
    #[must_use]
    pub fn success(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            response_time: Some(elapsed.as_secs_f64()),
            timestamp: Utc::now(),
            status_code: None,
            attempts: 1,
            details: BTreeMap::new(),
        }
    }

    /// Creates a failed result
    #[must_use]
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            response_time: None,
            timestamp: Utc::now(),
            status_code: None,
            attempts: 0,
            details: BTreeMap::new(),
        }
    }

    /// Sets the elapsed time
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.response_time = Some(elapsed.as_secs_f64());
        self
    }

    /// Sets the final status code
    #[must_use]
    pub const fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Sets the attempt count
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Adds a detail
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns true if the test passed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if the test failed
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.success
    }

    /// Response time in whole milliseconds
    #[must_use]
    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time.map(|secs| (secs * 1000.0).round() as u64)
    }
}
