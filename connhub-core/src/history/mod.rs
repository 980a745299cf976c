//! Bounded per-connection test history
//!
//! Each connection keeps at most `limit` results, newest last. The log is
//! read by the stats aggregator and by callers asking for recent results.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::models::ConnectionTestResult;

/// Default number of results kept per connection
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Ring of recent test results, keyed by connection id
#[derive(Debug, Clone)]
pub struct TestHistory {
    limit: usize,
    entries: HashMap<Uuid, VecDeque<ConnectionTestResult>>,
}

impl Default for TestHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl TestHistory {
    /// Creates an empty history keeping `limit` results per connection
    ///
    /// A limit of 0 is treated as 1.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            entries: HashMap::new(),
        }
    }

    /// Per-connection capacity
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Appends a result, evicting the oldest one when full
    pub fn push(&mut self, id: Uuid, result: ConnectionTestResult) {
        let log = self.entries.entry(id).or_default();
        if log.len() == self.limit {
            log.pop_front();
        }
        log.push_back(result);
    }

    /// Newest `limit` results for `id`, oldest first
    #[must_use]
    pub fn recent(&self, id: Uuid, limit: usize) -> Vec<ConnectionTestResult> {
        self.entries.get(&id).map_or_else(Vec::new, |log| {
            let skip = log.len().saturating_sub(limit);
            log.iter().skip(skip).cloned().collect()
        })
    }

    /// Most recent result for `id`
    #[must_use]
    pub fn latest(&self, id: Uuid) -> Option<&ConnectionTestResult> {
        self.entries.get(&id).and_then(VecDeque::back)
    }

    /// Most recent successful result for `id`
    #[must_use]
    pub fn latest_success(&self, id: Uuid) -> Option<&ConnectionTestResult> {
        self.entries
            .get(&id)
            .and_then(|log| log.iter().rev().find(|r| r.success))
    }

    /// Number of results kept for `id`
    #[must_use]
    pub fn len(&self, id: Uuid) -> usize {
        self.entries.get(&id).map_or(0, VecDeque::len)
    }

    /// Returns true if nothing is recorded for any connection
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(VecDeque::is_empty)
    }

    /// Forgets every result for `id`
    pub fn clear(&mut self, id: Uuid) {
        self.entries.remove(&id);
    }
}
