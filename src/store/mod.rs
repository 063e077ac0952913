//! Durable tier of the geo cache.
//!
//! The whole cache is persisted as one JSON object (`address -> GeoRecord`)
//! under a single namespaced identifier. Backends only move the serialized
//! blob; decoding, and degrading on corrupt content, happens here so every
//! backend behaves the same way.
//!
//! Writes are never issued directly by callers: they go through
//! [`DurableWriter`], the single task allowed to mutate the store, and only
//! after [`Hydration`] has merged the stored snapshot into the hot cache.

mod file;
mod hydration;
mod memory;
mod sqlite;
mod writer;

pub use file::FileStore;
pub use hydration::Hydration;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use writer::DurableWriter;

use async_trait::async_trait;

use crate::cache::StoreSnapshot;
use crate::error_handling::StoreError;
use crate::geo::GeoRecord;

/// Result of reading the durable snapshot.
#[derive(Debug, Default)]
pub struct LoadedSnapshot {
    /// Entries that decoded into valid records
    pub entries: StoreSnapshot,
    /// The blob existed but was not a JSON object and was ignored
    pub corrupt: bool,
    /// Entries dropped because they did not decode or lacked a country code
    pub skipped: usize,
}

/// Persistent storage for the serialized cache snapshot.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Reads the raw serialized snapshot, `None` if nothing was stored yet.
    async fn read_blob(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the stored snapshot with `blob`.
    async fn write_blob(&self, blob: &str) -> Result<(), StoreError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Loads every stored entry.
    ///
    /// Unparsable content yields an empty mapping flagged as corrupt, never an
    /// error. Only a failed read is reported as `Err`.
    async fn load_all(&self) -> Result<LoadedSnapshot, StoreError> {
        match self.read_blob().await? {
            Some(blob) => Ok(decode_snapshot(&blob)),
            None => Ok(LoadedSnapshot::default()),
        }
    }

    /// Serializes and stores the full snapshot.
    async fn save_all(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let blob = serde_json::to_string(snapshot)?;
        self.write_blob(&blob).await
    }
}

/// Decodes a serialized snapshot, degrading instead of failing.
///
/// A blob that is not a JSON object is treated as empty. Inside a valid object,
/// entries that do not decode or carry no country code are skipped one by one.
pub fn decode_snapshot(blob: &str) -> LoadedSnapshot {
    if blob.trim().is_empty() {
        return LoadedSnapshot::default();
    }

    let object = match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(blob) {
        Ok(object) => object,
        Err(e) => {
            log::warn!("Ignoring unparsable geo cache snapshot: {}", e);
            return LoadedSnapshot {
                corrupt: true,
                ..Default::default()
            };
        }
    };

    let mut loaded = LoadedSnapshot::default();
    for (key, value) in object {
        match serde_json::from_value::<GeoRecord>(value) {
            Ok(record) if record.has_country_code() => {
                loaded.entries.insert(key, record);
            }
            Ok(_) => {
                log::debug!("Skipping persisted geo entry for {} without country code", key);
                loaded.skipped += 1;
            }
            Err(e) => {
                log::debug!("Skipping undecodable geo entry for {}: {}", key, e);
                loaded.skipped += 1;
            }
        }
    }
    loaded
}
