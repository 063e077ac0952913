//! Durable store initialization.

use std::sync::Arc;

use crate::config::{GeoCacheConfig, Opt, StoreKind};
use crate::error_handling::InitializationError;
use crate::store::{DurableStore, FileStore, MemoryStore, SqliteStore};

/// Opens the durable store selected on the command line.
///
/// The SQLite snapshot is keyed by the configured namespace.
///
/// # Errors
///
/// Returns `InitializationError::StoreError` if the SQLite database cannot be
/// created or opened. File and memory stores defer all I/O to first use.
pub async fn init_store(opt: &Opt) -> Result<Arc<dyn DurableStore>, InitializationError> {
    let config = GeoCacheConfig::from(opt);
    let store: Arc<dyn DurableStore> = match opt.store {
        StoreKind::Sqlite => Arc::new(SqliteStore::open(&opt.db_path, &config.namespace).await?),
        StoreKind::File => Arc::new(FileStore::new(&opt.cache_file)),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    log::info!("Using geo cache store {}", store.describe());
    Ok(store)
}
