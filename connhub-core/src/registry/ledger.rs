//! In-flight test tickets and per-connection locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Identifies one in-flight test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestTicket {
    /// Connection under test
    pub connection_id: Uuid,
    /// Monotonic epoch, unique across the ledger
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    next_epoch: u64,
    tickets: HashMap<Uuid, u64>,
}

/// Tracks which connections have a test in flight
///
/// Deleting or deactivating a connection revokes its ticket, so a result
/// that arrives later no longer matches and is discarded.
#[derive(Debug, Default)]
pub struct InFlightLedger {
    state: Mutex<LedgerState>,
}

impl InFlightLedger {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket unless one is already outstanding for `id`
    pub fn issue(&self, id: Uuid) -> Option<TestTicket> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.tickets.contains_key(&id) {
            return None;
        }
        state.next_epoch += 1;
        let epoch = state.next_epoch;
        state.tickets.insert(id, epoch);
        Some(TestTicket {
            connection_id: id,
            epoch,
        })
    }

    /// Returns true if a test is in flight for `id`
    #[must_use]
    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tickets
            .contains_key(&id)
    }

    /// Removes `ticket` if it is still the current one for its connection
    ///
    /// Returns false for a revoked or superseded ticket.
    pub fn complete(&self, ticket: TestTicket) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.tickets.get(&ticket.connection_id) == Some(&ticket.epoch) {
            state.tickets.remove(&ticket.connection_id);
            true
        } else {
            false
        }
    }

    /// Revokes any outstanding ticket for `id`
    ///
    /// Returns true if a test was in flight.
    pub fn revoke(&self, id: Uuid) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tickets
            .remove(&id)
            .is_some()
    }

    /// Number of tests in flight
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tickets
            .len()
    }

    /// Returns true if no test is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One async mutex per connection id
///
/// Serializes every read-modify-write of a single connection record while
/// leaving different connections independent.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`
    pub async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops the lock entry for a deleted connection
    pub fn forget(&self, id: Uuid) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}
