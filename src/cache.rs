//! In-memory hot cache.
//!
//! Process-lifetime `address -> GeoRecord` mapping. Reads and writes are
//! synchronous and never fail; a poisoned lock is recovered rather than
//! propagated because the map is always left in a consistent state.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::geo::GeoRecord;

/// Serializable view of the cache, keyed by address.
pub type StoreSnapshot = BTreeMap<String, GeoRecord>;

/// Where a cached record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Produced by a lookup in this process
    Resolved,
    /// Loaded from the durable store
    Durable,
}

#[derive(Debug)]
struct Slot {
    record: Arc<GeoRecord>,
    origin: EntryOrigin,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Slot>,
    /// Insertion order, used only when a capacity is configured.
    order: VecDeque<String>,
}

/// Hot (memory) tier of the geo cache.
#[derive(Debug)]
pub struct HotCache {
    inner: RwLock<Inner>,
    max_entries: Option<usize>,
}

impl HotCache {
    /// Creates an empty, unbounded cache.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Creates an empty cache that keeps at most `max_entries` addresses.
    ///
    /// When full, inserting a new address evicts the oldest inserted one.
    /// `None` or `Some(0)` means unbounded.
    pub fn with_capacity(max_entries: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_entries: max_entries.filter(|&n| n > 0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Record cached for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<GeoRecord>> {
        self.read().entries.get(key).map(|slot| slot.record.clone())
    }

    /// Record cached for `key` together with where it came from.
    pub fn lookup(&self, key: &str) -> Option<(Arc<GeoRecord>, EntryOrigin)> {
        self.read()
            .entries
            .get(key)
            .map(|slot| (slot.record.clone(), slot.origin))
    }

    /// Whether `key` is cached. Keys are compared exactly.
    pub fn contains(&self, key: &str) -> bool {
        self.read().entries.contains_key(key)
    }

    /// Inserts a record, returning the addresses evicted to make room.
    ///
    /// Re-inserting an existing address replaces the record in place and keeps
    /// its position in the eviction order.
    pub fn put(&self, key: &str, record: Arc<GeoRecord>) -> Vec<String> {
        let mut inner = self.write();
        let slot = Slot {
            record,
            origin: EntryOrigin::Resolved,
        };
        if inner.entries.insert(key.to_string(), slot).is_some() {
            return Vec::new();
        }
        inner.order.push_back(key.to_string());
        self.evict_over_capacity(&mut inner)
    }

    /// Seeds the cache from a durable snapshot.
    ///
    /// Addresses already present are left untouched so a record produced by a
    /// resolution in this process is never replaced by an older persisted one.
    /// Returns the number of addresses added.
    pub fn hydrate(&self, snapshot: StoreSnapshot) -> usize {
        let mut inner = self.write();
        let mut added: usize = 0;
        for (key, record) in snapshot {
            if inner.entries.contains_key(&key) {
                continue;
            }
            inner.entries.insert(
                key.clone(),
                Slot {
                    record: Arc::new(record),
                    origin: EntryOrigin::Durable,
                },
            );
            inner.order.push_back(key);
            added += 1;
        }
        let evicted = self.evict_over_capacity(&mut inner);
        added.saturating_sub(evicted.len())
    }

    fn evict_over_capacity(&self, inner: &mut Inner) -> Vec<String> {
        let Some(max) = self.max_entries else {
            return Vec::new();
        };
        let mut evicted = Vec::new();
        while inner.entries.len() > max {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        if !evicted.is_empty() {
            log::debug!("Evicted {} geo cache entries: {:?}", evicted.len(), evicted);
        }
        evicted
    }

    /// Copy of every cached record, used as the merge base for durable writes.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.read()
            .entries
            .iter()
            .map(|(k, slot)| (k.clone(), GeoRecord::clone(&slot.record)))
            .collect()
    }

    /// Number of cached addresses.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HotCache {
    fn default() -> Self {
        Self::new()
    }
}
