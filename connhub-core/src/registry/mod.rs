//! Connection registry
//!
//! The façade callers use for every connection operation. Storage is
//! delegated to a [`ConnectionStore`]; this layer adds local validation,
//! the status state machine, in-flight test tracking and stale-result
//! handling.
//!
//! At most one test is in flight per connection. A second test request is
//! rejected with [`ConnHubError::TestInProgress`]. Results are applied
//! under a per-connection lock, and only if the test's ticket is still
//! current and the stored connection still exists with `isActive` set.
//! Discarded results are not recorded in history.
//!
//! A stored `testing` status with no ticket in the ledger is a test that
//! never finished, for example because storage failed while its result was
//! being written. The next test resolves it as a failure first.

mod ledger;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub use ledger::{InFlightLedger, KeyedLocks, TestTicket};

use crate::error::{ConnHubError, ConnHubResult, StoreError};
use crate::health::{BulkHealthChecker, BulkTestReport, DEFAULT_CONCURRENCY};
use crate::history::{DEFAULT_HISTORY_LIMIT, TestHistory};
use crate::models::{
    Connection, ConnectionFormData, ConnectionStatus, ConnectionTemplate, ConnectionTestResult,
    ConnectionUpdate, validate_connection, validate_form, validate_update,
};
use crate::state::{StatusEvent, apply_event, apply_result};
use crate::stats::{DashboardStats, compute_stats};
use crate::store::{ConnectionPage, ConnectionQuery, ConnectionStore};
use crate::testing::{ConnectionTester, TestMode, TestOverrides};

/// Error text for a bulk id that does not exist
pub const NOT_FOUND_ERROR: &str = "connection not found";

/// Error text for a bulk id whose connection is disabled
pub const INACTIVE_ERROR: &str = "connection is inactive";

/// Error text for a bulk id that is already being tested
pub const IN_PROGRESS_ERROR: &str = "test already in progress";

/// Message on results for tests that were never dispatched
pub const NOT_RUN_MESSAGE: &str = "Connection test not run";

/// Message on the failure recorded for a test that never finished
pub const ABANDONED_MESSAGE: &str = "Connection test abandoned";

/// Error text on the failure recorded for a test that never finished
pub const ABANDONED_ERROR: &str = "previous test abandoned";

/// How a stored result was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Yes,
    Stale,
}

/// Single entry point for connection management
pub struct ConnectionRegistry {
    store: Arc<dyn ConnectionStore>,
    checker: BulkHealthChecker,
    history: Mutex<TestHistory>,
    ledger: InFlightLedger,
    locks: KeyedLocks,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("concurrency", &self.checker.concurrency())
            .field("in_flight", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    /// Creates a registry over `store` using `tester` for every test
    #[must_use]
    pub fn new(store: Arc<dyn ConnectionStore>, tester: ConnectionTester) -> Self {
        Self {
            store,
            checker: BulkHealthChecker::new(tester).with_concurrency(DEFAULT_CONCURRENCY),
            history: Mutex::new(TestHistory::new(DEFAULT_HISTORY_LIMIT)),
            ledger: InFlightLedger::new(),
            locks: KeyedLocks::new(),
        }
    }

    /// Sets the bulk concurrency cap
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.checker = self.checker.with_concurrency(concurrency);
        self
    }

    /// Sets how many results are kept per connection
    #[must_use]
    pub fn with_history_limit(self, limit: usize) -> Self {
        Self {
            history: Mutex::new(TestHistory::new(limit)),
            ..self
        }
    }

    /// The bulk concurrency cap
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.checker.concurrency()
    }

    /// Returns true if a test is in flight for `id`
    #[must_use]
    pub fn is_testing(&self, id: Uuid) -> bool {
        self.ledger.is_in_flight(id)
    }

    fn is_abandoned(&self, connection: &Connection) -> bool {
        connection.is_active
            && connection.status == ConnectionStatus::Testing
            && !self.ledger.is_in_flight(connection.id)
    }

    fn with_history<T>(&self, f: impl FnOnce(&mut TestHistory) -> T) -> T {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut history)
    }

    // ---- CRUD ----

    /// Creates a connection from user input
    ///
    /// # Errors
    ///
    /// Returns `Validation` without contacting storage if the input breaks
    /// an invariant, or `Store` if storage fails.
    pub async fn create(&self, form: ConnectionFormData) -> ConnHubResult<Connection> {
        validate_form(&form)?;
        let connection = form.into_connection();
        let stored = self.store.insert(&connection).await?;
        info!(connection_id = %stored.id, name = %stored.name, "Created connection");
        Ok(stored)
    }

    /// Applies a partial update
    ///
    /// A change of `isActive` goes through the state machine; deactivation
    /// invalidates any in-flight test.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any storage call for invalid fields,
    /// `NotFound` for unknown ids, or `Store` if storage fails.
    pub async fn update(&self, id: Uuid, update: ConnectionUpdate) -> ConnHubResult<Connection> {
        validate_update(&update)?;
        let _guard = self.locks.lock(id).await;

        let mut connection = self.store.get(id).await?;
        update.apply_to(&mut connection);
        validate_connection(&connection)?;
        if let Some(active) = update.is_active {
            self.toggle_active(&mut connection, active)?;
        }

        let stored = self.store.replace(&connection).await?;
        info!(connection_id = %id, "Updated connection");
        Ok(stored)
    }

    /// Deletes a connection
    ///
    /// An in-flight test keeps running but its result is dropped.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids or `Store` if storage fails.
    pub async fn delete(&self, id: Uuid) -> ConnHubResult<()> {
        {
            let _guard = self.locks.lock(id).await;
            self.store.remove(id).await?;
            if self.ledger.revoke(id) {
                debug!(connection_id = %id, "Revoked in-flight test for deleted connection");
            }
            self.with_history(|h| h.clear(id));
        }
        self.locks.forget(id);
        info!(connection_id = %id, "Deleted connection");
        Ok(())
    }

    /// Fetches one connection
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids or `Store` if storage fails.
    pub async fn get(&self, id: Uuid) -> ConnHubResult<Connection> {
        Ok(self.store.get(id).await?)
    }

    /// Lists connections matching `query`
    ///
    /// # Errors
    ///
    /// Returns `Store` if storage fails.
    pub async fn list(&self, query: &ConnectionQuery) -> ConnHubResult<ConnectionPage> {
        Ok(self.store.list(query).await?)
    }

    /// Every stored connection, oldest first
    ///
    /// # Errors
    ///
    /// Returns `Store` if storage fails.
    pub async fn list_all(&self) -> ConnHubResult<Vec<Connection>> {
        let mut connections = self.store.all().await?;
        connections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(connections)
    }

    /// Sets the administrative on/off switch
    ///
    /// Setting the current value again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids or `Store` if storage fails.
    pub async fn set_active(&self, id: Uuid, active: bool) -> ConnHubResult<Connection> {
        let _guard = self.locks.lock(id).await;
        let mut connection = self.store.get(id).await?;
        if connection.is_active == active {
            return Ok(connection);
        }
        self.toggle_active(&mut connection, active)?;
        let stored = self.store.replace(&connection).await?;
        info!(connection_id = %id, active, "Changed connection activation");
        Ok(stored)
    }

    fn toggle_active(&self, connection: &mut Connection, active: bool) -> ConnHubResult<()> {
        if connection.is_active == active {
            return Ok(());
        }
        if active {
            apply_event(connection, StatusEvent::Reactivated)?;
        } else {
            apply_event(connection, StatusEvent::Deactivated)?;
            if self.ledger.revoke(connection.id) {
                debug!(connection_id = %connection.id, "Revoked in-flight test for deactivated connection");
            }
        }
        Ok(())
    }

    // ---- Testing ----

    /// Tests one connection on demand
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Inactive` or `TestInProgress` before any
    /// network call. Test failures are returned as `Ok` results with
    /// `success = false`.
    pub async fn test_connection(&self, id: Uuid) -> ConnHubResult<ConnectionTestResult> {
        self.test_connection_with(id, TestMode::OnDemand, &TestOverrides::default())
            .await
    }

    /// Tests one connection with an explicit mode and optional overrides
    ///
    /// # Errors
    ///
    /// Same as [`Self::test_connection`], plus `Store` if the result cannot
    /// be written back.
    #[instrument(skip(self, id, overrides), fields(connection_id = %id, mode = %mode))]
    pub async fn test_connection_with(
        &self,
        id: Uuid,
        mode: TestMode,
        overrides: &TestOverrides,
    ) -> ConnHubResult<ConnectionTestResult> {
        let (connection, ticket) = self.begin_test(id).await?;
        let result = self
            .checker
            .tester()
            .test_with(&connection, mode, overrides)
            .await;
        self.finish_test(ticket, &result).await?;
        Ok(result)
    }

    /// Tests unsaved form input without touching any state
    ///
    /// The form is validated and tested as a transient connection. Nothing
    /// is read from or written to storage, the ledger or history.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any network call if the input breaks an
    /// invariant. Test failures are returned as `Ok` results with
    /// `success = false`.
    #[instrument(skip(self, form, overrides), fields(name = %form.name))]
    pub async fn test_form(
        &self,
        form: &ConnectionFormData,
        overrides: &TestOverrides,
    ) -> ConnHubResult<ConnectionTestResult> {
        validate_form(form)?;
        let draft = form.clone().into_connection();
        let result = self
            .checker
            .tester()
            .test_with(&draft, TestMode::OnDemand, overrides)
            .await;
        debug!(success = result.success, "Tested unsaved connection");
        Ok(result)
    }

    /// Tests many connections in capped batches
    ///
    /// Every requested id gets a result. Unknown, inactive and already
    /// testing ids get a failure result without a network call. Results
    /// are applied after all batches complete. Repeated ids are tested
    /// once.
    #[instrument(skip(self, ids), fields(count = ids.len(), mode = %mode))]
    pub async fn test_connections(&self, ids: &[Uuid], mode: TestMode) -> BulkTestReport {
        let mut report = BulkTestReport::new();
        let mut runnable = Vec::new();
        let mut tickets = Vec::new();

        for &id in ids {
            if report.get(&id).is_some() || tickets.iter().any(|t: &TestTicket| t.connection_id == id) {
                continue;
            }
            match self.begin_test(id).await {
                Ok((connection, ticket)) => {
                    runnable.push(connection);
                    tickets.push(ticket);
                }
                Err(error) => report.insert(id, not_run(&error)),
            }
        }

        let results = self.checker.check(&runnable, mode).await;

        for (ticket, (id, result)) in tickets.into_iter().zip(results) {
            if let Err(error) = self.finish_test(ticket, &result).await {
                warn!(connection_id = %id, error = %error, "Failed to record test result");
            }
            report.insert(id, result);
        }

        report.log_summary();
        report
    }

    /// Ids whose scheduled health check is due at `now`
    ///
    /// # Errors
    ///
    /// Returns `Store` if storage fails.
    pub async fn due_health_checks(&self, now: DateTime<Utc>) -> ConnHubResult<Vec<Uuid>> {
        let connections = self.store.all().await?;
        let mut due: Vec<&Connection> = connections
            .iter()
            .filter(|c| c.due_for_health_check(now) && !self.ledger.is_in_flight(c.id))
            .collect();
        due.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(due.into_iter().map(|c| c.id).collect())
    }

    /// Runs every health check due at `now`
    ///
    /// # Errors
    ///
    /// Returns `Store` if the due list cannot be read.
    pub async fn run_due_health_checks(&self, now: DateTime<Utc>) -> ConnHubResult<BulkTestReport> {
        let due = self.due_health_checks(now).await?;
        debug!(count = due.len(), "Running due health checks");
        Ok(self.test_connections(&due, TestMode::HealthCheck).await)
    }

    async fn begin_test(&self, id: Uuid) -> ConnHubResult<(Connection, TestTicket)> {
        let _guard = self.locks.lock(id).await;
        let mut connection = self.store.get(id).await?;

        if !connection.is_active {
            return Err(ConnHubError::Inactive(id));
        }
        if self.ledger.is_in_flight(id) {
            return Err(ConnHubError::TestInProgress(id));
        }
        let abandoned = if self.is_abandoned(&connection) {
            let result = ConnectionTestResult::failure(ABANDONED_MESSAGE, ABANDONED_ERROR);
            apply_result(&mut connection, &result)?;
            warn!(connection_id = %id, "Resolved abandoned test as failed");
            Some(result)
        } else {
            None
        };

        apply_event(&mut connection, StatusEvent::TestStarted)?;
        let ticket = self
            .ledger
            .issue(id)
            .ok_or(ConnHubError::TestInProgress(id))?;

        match self.store.replace(&connection).await {
            Ok(stored) => {
                if let Some(result) = abandoned {
                    self.with_history(|h| h.push(id, result));
                }
                Ok((stored, ticket))
            }
            Err(error) => {
                self.ledger.revoke(id);
                Err(error.into())
            }
        }
    }

    async fn finish_test(
        &self,
        ticket: TestTicket,
        result: &ConnectionTestResult,
    ) -> ConnHubResult<()> {
        let id = ticket.connection_id;
        let _guard = self.locks.lock(id).await;
        let current = self.ledger.complete(ticket);

        let mut connection = match self.store.get(id).await {
            Ok(connection) => connection,
            Err(StoreError::NotFound(_)) => {
                info!(connection_id = %id, "Discarding stale test result: connection deleted");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let applied = if !current || !connection.is_active {
            Applied::Stale
        } else if apply_result(&mut connection, result).is_err() {
            Applied::Stale
        } else {
            self.store.replace(&connection).await?;
            Applied::Yes
        };

        if applied == Applied::Stale {
            info!(
                connection_id = %id,
                status = %connection.status,
                "Discarding stale test result"
            );
        } else {
            debug!(
                connection_id = %id,
                success = result.success,
                status = %connection.status,
                "Applied test result"
            );
            self.with_history(|h| h.push(id, result.clone()));
        }
        Ok(())
    }

    // ---- Read models ----

    /// Newest `limit` results for a connection, oldest first
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids or `Store` if storage fails.
    pub async fn history(&self, id: Uuid, limit: usize) -> ConnHubResult<Vec<ConnectionTestResult>> {
        self.store.get(id).await?;
        Ok(self.with_history(|h| h.recent(id, limit)))
    }

    /// Dashboard summary at `now`
    ///
    /// # Errors
    ///
    /// Returns `Store` if storage fails.
    pub async fn stats(&self, now: DateTime<Utc>) -> ConnHubResult<DashboardStats> {
        let connections = self.store.all().await?;
        Ok(self.with_history(|h| compute_stats(&connections, h, now)))
    }

    /// Built-in templates
    #[must_use]
    pub fn list_templates(&self) -> Vec<ConnectionTemplate> {
        crate::template::list_templates()
    }
}

fn not_run(error: &ConnHubError) -> ConnectionTestResult {
    let reason = match error {
        ConnHubError::NotFound(_) => NOT_FOUND_ERROR.to_string(),
        ConnHubError::Inactive(_) => INACTIVE_ERROR.to_string(),
        ConnHubError::TestInProgress(_) => IN_PROGRESS_ERROR.to_string(),
        other => other.to_string(),
    };
    ConnectionTestResult::failure(NOT_RUN_MESSAGE, reason)
}
