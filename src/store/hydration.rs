//! One-time load of the durable snapshot into the hot cache.
//!
//! Shared by the coordinator (before answering requests) and the durable
//! writer (before its first save). The hot cache is the writer's merge base,
//! so a save must never happen until the persisted entries are in it; a save
//! issued after a failed read would replace them with this session's keys.
//!
//! A failed read leaves the load undone and the next caller tries again.
//! Corrupt content is not a failure: it loads as empty and counts as done.

use tokio::sync::OnceCell;

use super::DurableStore;
use crate::cache::HotCache;
use crate::error_handling::{CacheEvent, CacheStats, StoreError};

/// Tracks whether the durable snapshot has been merged into the hot cache.
#[derive(Debug, Default)]
pub struct Hydration {
    loaded: OnceCell<usize>,
}

impl Hydration {
    /// Creates a hydration that has not run yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a load has completed successfully.
    pub fn is_done(&self) -> bool {
        self.loaded.initialized()
    }

    /// Loads the snapshot unless an earlier call already did.
    ///
    /// Concurrent callers wait for the same load. Returns the number of
    /// addresses the successful load added.
    ///
    /// # Errors
    ///
    /// Returns the store's read error; nothing is recorded and a later call
    /// retries.
    pub async fn ensure(
        &self,
        store: &dyn DurableStore,
        cache: &HotCache,
        stats: &CacheStats,
    ) -> Result<usize, StoreError> {
        self.loaded
            .get_or_try_init(|| async {
                let loaded = store.load_all().await?;
                if loaded.corrupt {
                    stats.increment(CacheEvent::StoreCorruption);
                }
                let added = cache.hydrate(loaded.entries);
                log::debug!(
                    "Hydrated {} geo cache entries from {} ({} skipped)",
                    added,
                    store.describe(),
                    loaded.skipped
                );
                Ok::<usize, StoreError>(added)
            })
            .await
            .copied()
    }
}
