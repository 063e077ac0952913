//! server_geo library: address-to-geography resolution cache
//!
//! This library maps network addresses (typically game server IPs) to country,
//! city and timezone metadata. Results are kept in a process-wide hot cache,
//! persisted to a durable store that survives restarts, and looked up from an
//! ipwho.is-compatible service at most once per address at a time.
//!
//! # Example
//!
//! ```no_run
//! use server_geo::{GeoCacheConfig, GeoCoordinator, SqliteStore, STORE_NAMESPACE};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeoCacheConfig::default();
//! let store = SqliteStore::open(Path::new("server_geo.db"), STORE_NAMESPACE).await?;
//! let geo = GeoCoordinator::with_http_resolver(&config, Arc::new(store))?;
//! geo.hydrate().await;
//!
//! let mut flag = geo.watch("8.8.8.8");
//! if let Some(record) = flag.resolved().await {
//!     println!("{} {}", record.country_code, record.display_location());
//! }
//! geo.flush().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime: the coordinator spawns its lookup
//! and durable-writer tasks on the current runtime.

#![warn(missing_docs)]

mod cache;
pub mod config;
mod consumer;
mod coordinator;
mod error_handling;
mod geo;
pub mod initialization;
mod resolver;
mod store;

// Re-export public API
pub use cache::{EntryOrigin, HotCache, StoreSnapshot};
pub use config::{GeoCacheConfig, LogFormat, LogLevel, Opt, OutputFormat, StoreKind};
pub use config::{DEFAULT_GEO_SERVICE_BASE, STORE_NAMESPACE};
pub use consumer::{GeoState, GeoWatch};
pub use coordinator::{GeoCoordinator, Outcome};
pub use error_handling::{CacheEvent, CacheStats, InitializationError, LookupError, StoreError};
pub use geo::{GeoRecord, GeoTimezone};
pub use resolver::{normalize_response, GeoResolver, HttpResolver};
pub use store::{
    decode_snapshot, DurableStore, DurableWriter, FileStore, Hydration, LoadedSnapshot,
    MemoryStore, SqliteStore,
};
