//! Registry of in-flight lookups.
//!
//! One entry per address currently being resolved. The first request for an
//! address becomes the leader and starts the lookup; later requests subscribe
//! to the same broadcast channel and receive the same outcome.
//!
//! The resolution path writes the hot cache *before* completing the entry, and
//! registration checks the hot cache while holding the entry lock. A request
//! that finds no pending entry therefore either sees the cached record or
//! arrived before any lookup started; it can never miss a result.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::cache::HotCache;
use crate::config::PENDING_CHANNEL_CAPACITY;
use crate::geo::GeoRecord;

/// Outcome shared with every waiter: the record, or `None` on failure.
pub type Outcome = Option<Arc<GeoRecord>>;

/// Result of registering interest in an address.
pub enum Registration {
    /// No lookup was running; the caller must start one and wait on `receiver`.
    Leader(broadcast::Receiver<Outcome>),
    /// A lookup is already running; wait on the receiver for its outcome.
    Waiter(broadcast::Receiver<Outcome>),
    /// The record landed in the hot cache before registration.
    Cached(Arc<GeoRecord>),
}

#[derive(Default)]
pub struct PendingRegistry {
    in_flight: DashMap<String, broadcast::Sender<Outcome>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request for `key`, atomically with respect to completion.
    pub fn register(&self, key: &str, cache: &HotCache) -> Registration {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => Registration::Waiter(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                if let Some(record) = cache.get(key) {
                    return Registration::Cached(record);
                }
                let (tx, rx) = broadcast::channel(PENDING_CHANNEL_CAPACITY);
                entry.insert(tx);
                Registration::Leader(rx)
            }
        }
    }

    /// Removes the entry for `key` and broadcasts `outcome` to its waiters.
    ///
    /// Returns the number of waiters that were subscribed.
    pub fn complete(&self, key: &str, outcome: Outcome) -> usize {
        match self.in_flight.remove(key) {
            Some((_, tx)) => {
                let waiters = tx.receiver_count();
                // Waiters that already went away are not an error.
                let _ = tx.send(outcome);
                waiters
            }
            None => 0,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Completes a pending entry with a failure if the resolution task ends
/// without completing it (panic or runtime shutdown).
pub struct CompletionGuard {
    registry: Arc<PendingRegistry>,
    key: String,
    armed: bool,
}

impl CompletionGuard {
    pub fn new(registry: Arc<PendingRegistry>, key: &str) -> Self {
        Self {
            registry,
            key: key.to_string(),
            armed: true,
        }
    }

    /// Completes the entry with `outcome` and disarms the guard.
    pub fn complete(mut self, outcome: Outcome) -> usize {
        self.armed = false;
        self.registry.complete(&self.key, outcome)
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("Geo lookup for {} ended without a result", self.key);
            self.registry.complete(&self.key, None);
        }
    }
}
