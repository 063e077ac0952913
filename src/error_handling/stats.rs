//! Cache statistics tracking.
//!
//! This module provides thread-safe counters for cache events so the
//! coordinator's behavior (hits, coalescing, failures) can be observed and
//! asserted on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::CacheEvent;

/// Thread-safe cache statistics tracker.
///
/// Every `CacheEvent` variant is initialized to zero on creation, so lookups in
/// the counter map never miss. Shared across tasks with `Arc`.
#[derive(Debug)]
pub struct CacheStats {
    events: HashMap<CacheEvent, AtomicUsize>,
}

impl CacheStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in CacheEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        CacheStats { events }
    }

    /// Increment an event counter.
    pub fn increment(&self, event: CacheEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in CacheStats initialization.",
                event
            );
        }
    }

    /// Current value of an event counter.
    pub fn get(&self, event: CacheEvent) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Requests answered without a network call.
    pub fn total_hits(&self) -> usize {
        self.get(CacheEvent::HotHit) + self.get(CacheEvent::DurableHit)
    }

    /// Fraction of requests that attached to an already running lookup.
    pub fn coalescing_ratio(&self) -> f64 {
        let coalesced = self.get(CacheEvent::Coalesced);
        let total = coalesced + self.get(CacheEvent::LookupStarted);
        if total == 0 {
            0.0
        } else {
            coalesced as f64 / total as f64
        }
    }

    /// Logs a one-line summary of all non-zero counters.
    pub fn log_summary(&self) {
        let mut parts: Vec<String> = CacheEvent::iter()
            .filter_map(|event| {
                let count = self.get(event);
                (count > 0).then(|| format!("{}={}", event, count))
            })
            .collect();
        if parts.is_empty() {
            parts.push("no activity".to_string());
        }
        log::info!("Geo cache statistics: {}", parts.join(", "));
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}
