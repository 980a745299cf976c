//! Dashboard summary over a connection snapshot
//!
//! [`compute_stats`] is a pure function: it holds no state and yields the
//! same output for the same connections, history and `now`.

// Counts are converted to f64 for percentages and averages
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::TestHistory;
use crate::models::{Connection, ConnectionStatus, ConnectionType};

/// Rolling window for "recently used", in hours
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Number of connections in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// `pending`
    pub pending: usize,
    /// `testing`
    pub testing: usize,
    /// `active`
    pub active: usize,
    /// `inactive`
    pub inactive: usize,
    /// `error`
    pub error: usize,
}

impl StatusCounts {
    /// Count for one status
    #[must_use]
    pub const fn get(&self, status: ConnectionStatus) -> usize {
        match status {
            ConnectionStatus::Pending => self.pending,
            ConnectionStatus::Testing => self.testing,
            ConnectionStatus::Active => self.active,
            ConnectionStatus::Inactive => self.inactive,
            ConnectionStatus::Error => self.error,
        }
    }

    const fn increment(&mut self, status: ConnectionStatus) {
        match status {
            ConnectionStatus::Pending => self.pending += 1,
            ConnectionStatus::Testing => self.testing += 1,
            ConnectionStatus::Active => self.active += 1,
            ConnectionStatus::Inactive => self.inactive += 1,
            ConnectionStatus::Error => self.error += 1,
        }
    }

    /// Sum over all statuses
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.testing + self.active + self.inactive + self.error
    }
}

/// Summary shown on the connections dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Number of connections
    pub total: usize,
    /// Counts per status
    pub by_status: StatusCounts,
    /// Counts per type; every type is present, zero if unused
    pub by_type: BTreeMap<ConnectionType, usize>,
    /// Mean seconds over each connection's latest successful result
    pub average_response_time: Option<f64>,
    /// `active / (active + error + inactive + pending)` as 0-100
    pub uptime: f64,
    /// Connections connected within the last 24 hours, newest first
    pub recently_used: Vec<Uuid>,
}

impl DashboardStats {
    /// Number of connections of one type
    #[must_use]
    pub fn count_for_type(&self, connection_type: ConnectionType) -> usize {
        self.by_type.get(&connection_type).copied().unwrap_or(0)
    }
}

/// Computes dashboard stats for a connection snapshot
///
/// Connections with no successful result in `history` do not contribute to
/// the average. An empty set yields zero counts, no average and an uptime
/// of 0.
#[must_use]
pub fn compute_stats(
    connections: &[Connection],
    history: &TestHistory,
    now: DateTime<Utc>,
) -> DashboardStats {
    let mut by_status = StatusCounts::default();
    let mut by_type: BTreeMap<ConnectionType, usize> =
        ConnectionType::ALL.into_iter().map(|t| (t, 0)).collect();

    for connection in connections {
        by_status.increment(connection.status);
        *by_type.entry(connection.connection_type).or_insert(0) += 1;
    }

    let latencies: Vec<f64> = connections
        .iter()
        .filter_map(|c| history.latest_success(c.id))
        .filter_map(|r| r.response_time)
        .collect();
    let average_response_time = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    };

    let denominator =
        by_status.active + by_status.error + by_status.inactive + by_status.pending;
    let uptime = if denominator == 0 {
        0.0
    } else {
        by_status.active as f64 / denominator as f64 * 100.0
    };

    let window = Duration::hours(RECENT_WINDOW_HOURS);
    let mut recent: Vec<&Connection> = connections
        .iter()
        .filter(|c| c.connected_within(now, window))
        .collect();
    recent.sort_by(|a, b| b.last_connected.cmp(&a.last_connected).then(a.id.cmp(&b.id)));

    DashboardStats {
        total: connections.len(),
        by_status,
        by_type,
        average_response_time,
        uptime,
        recently_used: recent.into_iter().map(|c| c.id).collect(),
    }
}
