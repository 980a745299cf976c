//! Bulk health checking with bounded concurrency
//!
//! Connections are split into batches of `concurrency`. Every test in a
//! batch runs concurrently and the whole batch finishes before the next one
//! starts. A failing test never aborts its batch or later batches.

// Allow precision loss for percentage calculations
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Connection, ConnectionTestResult};
use crate::testing::{ConnectionTester, TestMode};

/// Default number of simultaneous tests
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs many connection tests in capped batches
#[derive(Debug, Clone)]
pub struct BulkHealthChecker {
    tester: ConnectionTester,
    concurrency: usize,
}

impl BulkHealthChecker {
    /// Creates a checker with the default concurrency cap
    #[must_use]
    pub const fn new(tester: ConnectionTester) -> Self {
        Self {
            tester,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the concurrency cap; 0 is treated as 1
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Current concurrency cap
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The single-connection tester used for each test
    #[must_use]
    pub const fn tester(&self) -> &ConnectionTester {
        &self.tester
    }

    /// Tests `connections` batch by batch
    ///
    /// Results come back in the order of `connections`. Within a batch,
    /// tests are dispatched in that order.
    pub async fn check(
        &self,
        connections: &[Connection],
        mode: TestMode,
    ) -> Vec<(Uuid, ConnectionTestResult)> {
        let mut results = Vec::with_capacity(connections.len());

        for (batch, chunk) in connections.chunks(self.concurrency).enumerate() {
            debug!(batch, size = chunk.len(), "Starting health-check batch");
            let outcomes = join_all(chunk.iter().map(|connection| async move {
                (connection.id, self.tester.test(connection, mode).await)
            }))
            .await;
            let healthy = outcomes.iter().filter(|(_, r)| r.success).count();
            debug!(batch, healthy, size = chunk.len(), "Health-check batch finished");
            results.extend(outcomes);
        }

        results
    }
}

/// Outcome of a bulk test run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTestReport {
    /// Result per requested id
    pub results: HashMap<Uuid, ConnectionTestResult>,
    /// Number of passing results
    pub healthy: usize,
    /// Number of failing results
    pub failed: usize,
}

impl BulkTestReport {
    /// Creates an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a report from per-id results
    ///
    /// A repeated id keeps its first result.
    #[must_use]
    pub fn from_results(results: impl IntoIterator<Item = (Uuid, ConnectionTestResult)>) -> Self {
        let mut report = Self::new();
        for (id, result) in results {
            report.insert(id, result);
        }
        report
    }

    /// Records the result for `id` unless one is already present
    pub fn insert(&mut self, id: Uuid, result: ConnectionTestResult) {
        if self.results.contains_key(&id) {
            return;
        }
        if result.success {
            self.healthy += 1;
        } else {
            self.failed += 1;
        }
        self.results.insert(id, result);
    }

    /// Number of ids with a result
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Result for one id
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&ConnectionTestResult> {
        self.results.get(id)
    }

    /// Returns true if every test passed
    #[must_use]
    pub const fn all_healthy(&self) -> bool {
        self.failed == 0
    }

    /// Percentage of passing tests (100 for an empty run)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        self.healthy as f64 / total as f64 * 100.0
    }

    /// Partial-success summary, e.g. `4/6 connections healthy`
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{}/{} connections healthy", self.healthy, self.total())
    }

    /// Ids whose test failed
    #[must_use]
    pub fn failed_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .results
            .iter()
            .filter(|(_, r)| !r.success)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn log_summary(&self) {
        info!(
            healthy = self.healthy,
            failed = self.failed,
            total = self.total(),
            "{}",
            self.summary_line()
        );
    }
}
