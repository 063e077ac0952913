//! Request coordination for the geo cache.
//!
//! `GeoCoordinator` is the single entry point consumers use. It answers from
//! the hot cache when it can, hydrates the hot cache from the durable store
//! once (retrying after a failed read), and otherwise makes sure each address is looked up by at most one
//! resolver call at a time, fanning the outcome out to every waiter.
//!
//! # Architecture
//!
//! ```text
//! request("8.8.8.8") ─┐
//!                     │   hot cache ──► hit: return now
//! request("8.8.8.8") ─┼─► durable hydration (once)
//!                     │   PendingRegistry ──► leader spawns ──► GeoResolver
//! watch("8.8.8.8") ───┘        ▲                                  │
//!                              │                                  ▼
//!                       broadcast outcome ◄── hot cache put + DurableWriter
//! ```
//!
//! The lookup runs in its own task, so a caller that stops waiting (or a
//! dropped `GeoWatch`) never cancels it; the result still lands in both tiers.

mod pending;

pub use pending::Outcome;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{EntryOrigin, HotCache};
use crate::config::GeoCacheConfig;
use crate::error_handling::{CacheEvent, CacheStats, InitializationError, LookupError};
use crate::geo::GeoRecord;
use crate::resolver::{GeoResolver, HttpResolver};
use crate::store::{DurableStore, DurableWriter, Hydration};
use pending::{CompletionGuard, PendingRegistry, Registration};

struct Shared {
    cache: Arc<HotCache>,
    store: Arc<dyn DurableStore>,
    resolver: Arc<dyn GeoResolver>,
    pending: Arc<PendingRegistry>,
    writer: DurableWriter,
    stats: Arc<CacheStats>,
    hydration: Arc<Hydration>,
    lookup_timeout: Duration,
}

/// Process-wide geo cache service.
///
/// Create one per process and share it by cloning (clones share all state).
/// Must be created inside a tokio runtime: construction spawns the durable
/// writer task.
#[derive(Clone)]
pub struct GeoCoordinator {
    shared: Arc<Shared>,
}

impl GeoCoordinator {
    /// Creates a coordinator from explicit collaborators.
    pub fn new(
        config: &GeoCacheConfig,
        resolver: Arc<dyn GeoResolver>,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        let cache = Arc::new(HotCache::with_capacity(config.max_entries));
        let stats = Arc::new(CacheStats::new());
        let hydration = Arc::new(Hydration::new());
        let writer = DurableWriter::spawn(
            store.clone(),
            cache.clone(),
            stats.clone(),
            hydration.clone(),
        );

        Self {
            shared: Arc::new(Shared {
                cache,
                store,
                resolver,
                pending: Arc::new(PendingRegistry::new()),
                writer,
                stats,
                hydration,
                lookup_timeout: config.lookup_timeout,
            }),
        }
    }

    /// Creates a coordinator and hydrates it before returning.
    ///
    /// Addresses held by the durable store are then answered synchronously by
    /// [`GeoCoordinator::cached`] and [`GeoCoordinator::watch`]. If the store
    /// cannot be read, the coordinator is still returned and hydration is
    /// retried by the next request.
    pub async fn open(
        config: &GeoCacheConfig,
        resolver: Arc<dyn GeoResolver>,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        let coordinator = Self::new(config, resolver, store);
        coordinator.hydrate().await;
        coordinator
    }

    /// Creates a coordinator that resolves through the HTTP lookup service.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn with_http_resolver(
        config: &GeoCacheConfig,
        store: Arc<dyn DurableStore>,
    ) -> Result<Self, InitializationError> {
        let resolver = HttpResolver::new(config)?;
        Ok(Self::new(config, Arc::new(resolver), store))
    }

    /// Synchronous read of the hot cache. Never touches the store or network.
    pub fn cached(&self, key: &str) -> Option<Arc<GeoRecord>> {
        self.shared.cache.get(key)
    }

    /// Whether a lookup for `key` is currently in flight.
    pub fn is_pending(&self, key: &str) -> bool {
        self.shared.pending.is_pending(key)
    }

    /// Number of lookups currently in flight.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// Number of addresses in the hot cache.
    pub fn cached_count(&self) -> usize {
        self.shared.cache.len()
    }

    /// Event counters for this coordinator.
    pub fn stats(&self) -> &CacheStats {
        &self.shared.stats
    }

    /// Loads the durable snapshot into the hot cache, once per coordinator.
    ///
    /// Concurrent callers wait for the same load. Corrupt content degrades to
    /// an empty snapshot. A failed read is logged and left undone, so the next
    /// call tries again. Returns the number of addresses the load added (`0`
    /// while it has not succeeded).
    pub async fn hydrate(&self) -> usize {
        let shared = &self.shared;
        match shared
            .hydration
            .ensure(&*shared.store, &shared.cache, &shared.stats)
            .await
        {
            Ok(added) => added,
            Err(e) => {
                log::warn!(
                    "Failed to read geo cache from {}, will retry: {}",
                    shared.store.describe(),
                    e
                );
                0
            }
        }
    }

    /// Whether the durable snapshot has been loaded into the hot cache.
    pub fn is_hydrated(&self) -> bool {
        self.shared.hydration.is_done()
    }

    /// Resolves `key` to a record, or `None` if no geo data is available.
    ///
    /// Concurrent calls for the same key share one lookup. Failures are not
    /// cached: the next call after a failure starts a fresh lookup.
    pub async fn request(&self, key: &str) -> Option<Arc<GeoRecord>> {
        if key.is_empty() {
            return None;
        }

        let shared = &self.shared;
        if let Some(record) = shared.cache.get(key) {
            shared.stats.increment(CacheEvent::HotHit);
            return Some(record);
        }

        self.hydrate().await;
        if let Some((record, origin)) = shared.cache.lookup(key) {
            let event = match origin {
                EntryOrigin::Durable => CacheEvent::DurableHit,
                EntryOrigin::Resolved => CacheEvent::HotHit,
            };
            shared.stats.increment(event);
            return Some(record);
        }

        let mut receiver = match shared.pending.register(key, &shared.cache) {
            Registration::Cached(record) => {
                shared.stats.increment(CacheEvent::HotHit);
                return Some(record);
            }
            Registration::Waiter(receiver) => {
                shared.stats.increment(CacheEvent::Coalesced);
                log::debug!("Waiting on in-flight geo lookup for {}", key);
                receiver
            }
            Registration::Leader(receiver) => {
                shared.stats.increment(CacheEvent::LookupStarted);
                self.spawn_resolution(key);
                receiver
            }
        };

        match receiver.recv().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Geo lookup for {} was abandoned: {}", key, e);
                None
            }
        }
    }

    /// Waits until every durable write scheduled so far has completed.
    pub async fn flush(&self) {
        self.shared.writer.flush().await;
    }

    fn spawn_resolution(&self, key: &str) {
        let shared = self.shared.clone();
        let guard = CompletionGuard::new(shared.pending.clone(), key);
        let key = key.to_string();

        tokio::spawn(async move {
            let outcome = match resolve_bounded(&shared, &key).await {
                Ok(record) => {
                    let record = Arc::new(record);
                    let evicted = shared.cache.put(&key, record.clone());
                    for _ in &evicted {
                        shared.stats.increment(CacheEvent::Evicted);
                    }
                    shared.writer.persist();
                    shared.stats.increment(CacheEvent::LookupSucceeded);
                    log::info!(
                        "Resolved {} to {} ({})",
                        key,
                        record.country_code,
                        record.display_location()
                    );
                    Some(record)
                }
                Err(e) => {
                    shared.stats.increment(CacheEvent::LookupFailed);
                    log::warn!("Failed to fetch geo for {}: {}", key, e);
                    None
                }
            };
            let waiters = guard.complete(outcome);
            log::debug!("Broadcast geo outcome for {} to {} waiter(s)", key, waiters);
        });
    }
}

async fn resolve_bounded(shared: &Shared, key: &str) -> Result<GeoRecord, LookupError> {
    match tokio::time::timeout(shared.lookup_timeout, shared.resolver.resolve(key)).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::Timeout(shared.lookup_timeout)),
    }
}
