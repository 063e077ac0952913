//! Process-local durable store.
//!
//! Holds the serialized blob in memory so the decode path is the same as for
//! the persistent backends. Used by `--store memory` and by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::DurableStore;
use crate::error_handling::StoreError;

/// Durable store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RwLock<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `blob`, as if written by an earlier process.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Current raw content.
    pub fn raw(&self) -> Option<String> {
        self.blob.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replaces the raw content without counting a write.
    pub fn set_raw(&self, blob: Option<String>) {
        *self.blob.write().unwrap_or_else(|e| e.into_inner()) = blob;
    }

    /// Number of completed `write_blob` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn read_blob(&self) -> Result<Option<String>, StoreError> {
        Ok(self.raw())
    }

    async fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        *self.blob.write().unwrap_or_else(|e| e.into_inner()) = Some(blob.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_raw_content_goes_through_decode() {
        let store = MemoryStore::new();
        assert!(store.load_all().await.expect("load").entries.is_empty());

        store.set_raw(Some("[1, 2, 3]".to_string()));
        let loaded = store.load_all().await.expect("load must not fail");
        assert!(loaded.corrupt);
        assert_eq!(store.write_count(), 0);

        store.write_blob("{}").await.expect("write");
        assert_eq!(store.raw().as_deref(), Some("{}"));
        assert_eq!(store.write_count(), 1);
    }
}
