//! Test doubles shared by the integration suites

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use connhub_core::error::{StoreError, StoreResult};
use connhub_core::models::{Connection, ConnectionFormData, ConnectionType};
use connhub_core::store::{ConnectionPage, ConnectionQuery, ConnectionStore, MemoryConnectionStore};
use connhub_core::testing::{
    ConnectionTester, ProbeError, ProbeRequest, ProbeResponse, ProbeTransport,
};
use connhub_core::ConnectionRegistry;
use tokio::sync::Notify;
use uuid::Uuid;

/// One scripted reply
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Reply with this status after the transport latency
    Status(u16),
    /// Hang until the caller's timeout fires
    Hang,
    /// Report a transport timeout after `after`
    TimedOut { after: Duration },
    /// Refuse the connection immediately
    Refused,
}

/// Probe transport that replays scripted steps per URL
///
/// URLs without a script get `fallback`. Tracks call counts and the peak
/// number of concurrent requests.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Step,
    latency: Duration,
    gate: Option<Arc<Gate>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

/// Holds requests until released
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Waits until a request is parked at the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets every parked request continue
    pub fn open(&self) {
        self.release.notify_waiters();
    }
}

impl ScriptedTransport {
    pub fn new(fallback: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            latency: Duration::ZERO,
            gate: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn script(self, url: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into_iter().collect());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn next_step(&self, url: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.fallback)
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn send(
        &self,
        request: &ProbeRequest,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.url.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(ref gate) = self.gate {
            let released = gate.release.notified();
            gate.entered.notify_one();
            released.await;
        }

        let step = self.next_step(&request.url);
        let reply = match step {
            Step::Status(status) => {
                tokio::time::sleep(self.latency).await;
                Ok(ProbeResponse { status })
            }
            Step::Hang => {
                tokio::time::sleep(timeout * 10).await;
                Err(ProbeError::Network("hang outlived its timeout".into()))
            }
            Step::TimedOut { after } => {
                tokio::time::sleep(after).await;
                Err(ProbeError::Timeout(timeout.as_secs()))
            }
            Step::Refused => Err(ProbeError::ConnectionRefused(request.url.clone())),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Store wrapper that counts every call
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryConnectionStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionStore for CountingStore {
    async fn insert(&self, connection: &Connection) -> StoreResult<Connection> {
        self.count();
        self.inner.insert(connection).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Connection> {
        self.count();
        self.inner.get(id).await
    }

    async fn replace(&self, connection: &Connection) -> StoreResult<Connection> {
        self.count();
        self.inner.replace(connection).await
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        self.count();
        self.inner.remove(id).await
    }

    async fn list(&self, query: &ConnectionQuery) -> StoreResult<ConnectionPage> {
        self.count();
        self.inner.list(query).await
    }
}

/// Store wrapper whose `nth` call to `get` fails once
pub struct FlakyStore {
    inner: MemoryConnectionStore,
    fail_at: usize,
    gets: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_get(nth: usize) -> Self {
        Self {
            inner: MemoryConnectionStore::new(),
            fail_at: nth,
            gets: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConnectionStore for FlakyStore {
    async fn insert(&self, connection: &Connection) -> StoreResult<Connection> {
        self.inner.insert(connection).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Connection> {
        if self.gets.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at {
            return Err(StoreError::Unavailable("blip".into()));
        }
        self.inner.get(id).await
    }

    async fn replace(&self, connection: &Connection) -> StoreResult<Connection> {
        self.inner.replace(connection).await
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        self.inner.remove(id).await
    }

    async fn list(&self, query: &ConnectionQuery) -> StoreResult<ConnectionPage> {
        self.inner.list(query).await
    }
}

/// Registry over a fresh in-memory store
pub fn registry(transport: Arc<ScriptedTransport>) -> ConnectionRegistry {
    ConnectionRegistry::new(
        Arc::new(MemoryConnectionStore::new()),
        ConnectionTester::new(transport),
    )
}

/// A valid form pointing at `base_url` with no retries
pub fn form(name: &str, base_url: &str) -> ConnectionFormData {
    let mut form = ConnectionFormData::new(name, ConnectionType::Api, "acme", base_url);
    form.config.retry_attempts = 0;
    form.config.retry_delay = 0;
    form
}
