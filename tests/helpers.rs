// Shared test helpers: a scriptable resolver, a slow store, and record builders.
//
// Included from other test files with `mod helpers;`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use server_geo::{
    DurableStore, GeoRecord, GeoResolver, GeoTimezone, LookupError, MemoryStore, StoreError,
};

type Behavior = dyn Fn(&str, usize) -> Result<GeoRecord, LookupError> + Send + Sync;

/// Resolver that counts calls and answers from a closure.
///
/// `attempt` passed to the closure is the 1-based call count for that address.
/// A gated resolver blocks every call until [`FakeResolver::release`].
pub struct FakeResolver {
    behavior: Box<Behavior>,
    calls: AtomicUsize,
    per_key: Mutex<HashMap<String, usize>>,
    gate: Option<Semaphore>,
}

impl FakeResolver {
    pub fn new<F>(behavior: F) -> Self
    where
        F: Fn(&str, usize) -> Result<GeoRecord, LookupError> + Send + Sync + 'static,
    {
        Self {
            behavior: Box::new(behavior),
            calls: AtomicUsize::new(0),
            per_key: Mutex::new(HashMap::new()),
            gate: None,
        }
    }

    pub fn gated<F>(behavior: F) -> Self
    where
        F: Fn(&str, usize) -> Result<GeoRecord, LookupError> + Send + Sync + 'static,
    {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(behavior)
        }
    }

    /// Resolver that answers every address with `record_for(address)`.
    pub fn always_ok() -> Self {
        Self::new(|address, _| Ok(record_for(address)))
    }

    /// Lets every blocked and future call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(10_000);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, address: &str) -> usize {
        self.per_key
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl GeoResolver for FakeResolver {
    async fn resolve(&self, address: &str) -> Result<GeoRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut per_key = self.per_key.lock().unwrap();
            let count = per_key.entry(address.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        (self.behavior)(address, attempt)
    }
}

/// Store whose writes take `delay`, wrapping a `MemoryStore`.
pub struct SlowStore {
    pub inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl DurableStore for SlowStore {
    async fn read_blob(&self) -> Result<Option<String>, StoreError> {
        self.inner.read_blob().await
    }

    async fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.write_blob(blob).await
    }

    fn describe(&self) -> String {
        "slow-memory".to_string()
    }
}

/// Store whose first `failures` reads fail, wrapping a `MemoryStore`.
///
/// `usize::MAX` failures make the store permanently unreadable. A gated store
/// holds every successful read until [`FlakyReadStore::release_reads`].
pub struct FlakyReadStore {
    pub inner: MemoryStore,
    failures_left: AtomicUsize,
    reads: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FlakyReadStore {
    pub fn new(inner: MemoryStore, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            reads: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(inner: MemoryStore, failures: usize) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(inner, failures)
        }
    }

    pub fn release_reads(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(10_000);
        }
    }

    /// Number of `read_blob` calls so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStore for FlakyReadStore {
    async fn read_blob(&self) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(StoreError::Io(std::io::Error::other("database is locked")));
        }
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        self.inner.read_blob().await
    }

    async fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        self.inner.write_blob(blob).await
    }

    fn describe(&self) -> String {
        "flaky-memory".to_string()
    }
}

/// Serialized snapshot holding `record_for(key)` for every key.
pub fn snapshot_blob(keys: &[&str]) -> String {
    let map: serde_json::Map<String, serde_json::Value> = keys
        .iter()
        .map(|key| {
            (
                key.to_string(),
                serde_json::to_value(record_for(key)).expect("serialize record"),
            )
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// The Mountain View record used by the 8.8.8.8 scenario.
pub fn mountain_view() -> GeoRecord {
    GeoRecord {
        country_code: "US".to_string(),
        country_name: "United States".to_string(),
        city: "Mountain View".to_string(),
        region: "California".to_string(),
        timezone: GeoTimezone {
            id: "America/Los_Angeles".to_string(),
            abbreviation: "PDT".to_string(),
            utc_offset: "-07:00".to_string(),
            current_local_time: "2024-06-01T09:15:30-07:00".to_string(),
        },
    }
}

/// Deterministic record derived from the address.
pub fn record_for(address: &str) -> GeoRecord {
    GeoRecord {
        country_code: "ZZ".to_string(),
        country_name: format!("Country of {}", address),
        city: format!("City of {}", address),
        region: String::new(),
        timezone: GeoTimezone::default(),
    }
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Awaits `future`, failing the test if it takes longer than five seconds.
pub async fn within_5s<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("future did not complete within 5s")
}
