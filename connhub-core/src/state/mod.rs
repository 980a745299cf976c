//! Connection status state machine
//!
//! Transition table:
//!
//! | From                          | Event           | To         |
//! |-------------------------------|-----------------|------------|
//! | `pending`, `active`, `error`  | test started    | `testing`  |
//! | `testing`                     | test succeeded  | `active`   |
//! | `testing`                     | test failed     | `error`    |
//! | any                           | deactivated     | `inactive` |
//! | `inactive`                    | reactivated     | `pending`  |
//!
//! Everything else is rejected with [`TransitionError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Connection, ConnectionStatus, ConnectionTestResult};

/// Input that drives a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    /// A test was invoked
    TestStarted,
    /// The in-flight test passed
    TestSucceeded,
    /// The in-flight test failed
    TestFailed,
    /// `isActive` was set to false
    Deactivated,
    /// `isActive` was set to true
    Reactivated,
}

impl StatusEvent {
    /// Every event
    pub const ALL: [Self; 5] = [
        Self::TestStarted,
        Self::TestSucceeded,
        Self::TestFailed,
        Self::Deactivated,
        Self::Reactivated,
    ];

    /// Returns the event name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TestStarted => "test_started",
            Self::TestSucceeded => "test_succeeded",
            Self::TestFailed => "test_failed",
            Self::Deactivated => "deactivated",
            Self::Reactivated => "reactivated",
        }
    }
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition not present in the table
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Illegal status transition: {event} while {from}")]
pub struct TransitionError {
    /// Status at the time of the event
    pub from: ConnectionStatus,
    /// Rejected event
    pub event: StatusEvent,
}

/// Computes the status that follows `from` on `event`
///
/// # Errors
///
/// Returns `TransitionError` if the table has no entry for the pair.
pub const fn next_status(
    from: ConnectionStatus,
    event: StatusEvent,
) -> Result<ConnectionStatus, TransitionError> {
    use ConnectionStatus as S;
    use StatusEvent as E;

    match (from, event) {
        (S::Pending | S::Active | S::Error, E::TestStarted) => Ok(S::Testing),
        (S::Testing, E::TestSucceeded) => Ok(S::Active),
        (S::Testing, E::TestFailed) => Ok(S::Error),
        (_, E::Deactivated) => Ok(S::Inactive),
        (S::Inactive, E::Reactivated) => Ok(S::Pending),
        _ => Err(TransitionError { from, event }),
    }
}

/// Returns true if the table contains an edge `from -> to`
#[must_use]
pub fn is_legal_edge(from: ConnectionStatus, to: ConnectionStatus) -> bool {
    StatusEvent::ALL
        .into_iter()
        .any(|event| next_status(from, event) == Ok(to))
}

/// The status implied by the administrative flag, the last result and
/// whether a test is in flight
#[must_use]
pub const fn derive_status(
    is_active: bool,
    last_success: Option<bool>,
    in_flight: bool,
) -> ConnectionStatus {
    if !is_active {
        ConnectionStatus::Inactive
    } else if in_flight {
        ConnectionStatus::Testing
    } else {
        match last_success {
            None => ConnectionStatus::Pending,
            Some(true) => ConnectionStatus::Active,
            Some(false) => ConnectionStatus::Error,
        }
    }
}

/// Applies an administrative or test-start event to a connection
///
/// Keeps `is_active` in step with the event. Test completions go through
/// [`apply_result`] so counters are updated together with the status.
///
/// # Errors
///
/// Returns `TransitionError` for illegal transitions, including test
/// events on an inactive connection. The connection is left unchanged.
pub fn apply_event(
    connection: &mut Connection,
    event: StatusEvent,
) -> Result<ConnectionStatus, TransitionError> {
    let from = connection.status;
    if !connection.is_active && event != StatusEvent::Reactivated && event != StatusEvent::Deactivated {
        return Err(TransitionError {
            from: ConnectionStatus::Inactive,
            event,
        });
    }
    let to = next_status(from, event)?;
    match event {
        StatusEvent::Deactivated => connection.is_active = false,
        StatusEvent::Reactivated => connection.is_active = true,
        _ => {}
    }
    connection.status = to;
    connection.touch();
    Ok(to)
}

/// Applies a completed test result to a connection in `testing`
///
/// On success `success_count` increments and `last_connected` is set; on
/// failure `error_count` increments. `last_tested` is set either way.
///
/// # Errors
///
/// Returns `TransitionError` if the connection is not `testing` or is
/// inactive. The connection is left unchanged.
pub fn apply_result(
    connection: &mut Connection,
    result: &ConnectionTestResult,
) -> Result<ConnectionStatus, TransitionError> {
    let event = if result.success {
        StatusEvent::TestSucceeded
    } else {
        StatusEvent::TestFailed
    };
    let to = apply_event(connection, event)?;

    if result.success {
        connection.success_count = connection.success_count.saturating_add(1);
        connection.last_connected = Some(result.timestamp);
    } else {
        connection.error_count = connection.error_count.saturating_add(1);
    }
    connection.last_tested = Some(result.timestamp);
    Ok(to)
}
