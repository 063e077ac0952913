//! Error handling and cache statistics.
//!
//! This module provides:
//! - Error type definitions for lookups, the durable store and initialization
//! - Cache event counters
//!
//! Nothing here is fatal to the process: lookup and store failures are
//! absorbed by the coordinator and only show up as missing geo data, in the
//! log, and in the counters.

mod stats;
mod types;

// Re-export public API
pub use stats::CacheStats;
pub use types::{CacheEvent, InitializationError, LookupError, StoreError};
