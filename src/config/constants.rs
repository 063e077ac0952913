//! Configuration constants.
//!
//! This module defines the defaults used by the geo cache: lookup service
//! location, timeouts, and persistence identifiers.

/// Default geography lookup service base URL.
pub const DEFAULT_GEO_SERVICE_BASE: &str = "https://ipwho.is";

/// Fields requested from the lookup service.
///
/// Only these are normalized into a `GeoRecord`; asking for less keeps the
/// response small.
pub const GEO_LOOKUP_FIELDS: &str = "country,country_code,city,region,timezone";

/// Per-lookup timeout in seconds.
///
/// A stalled lookup service must not wedge a pending request forever, so every
/// resolver call is bounded by this value (treated as a lookup failure).
pub const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Namespaced identifier the durable snapshot is stored under.
pub const STORE_NAMESPACE: &str = "server_geo_full_cache";

/// Default SQLite database path for the durable tier.
pub const DB_PATH: &str = "./server_geo.db";

/// Default JSON file path for the file-backed durable tier.
pub const CACHE_FILE_PATH: &str = "./server_geo_cache.json";

/// Capacity of the per-key broadcast channel used to fan out results.
///
/// Each pending request sends exactly one message, so a small capacity is enough
/// for any number of waiters.
pub const PENDING_CHANNEL_CAPACITY: usize = 4;

/// Flag image CDN used for country flags.
pub const FLAG_CDN_BASE: &str = "https://flagcdn.com";

/// Default User-Agent string for lookup requests.
pub const DEFAULT_USER_AGENT: &str = concat!("server_geo/", env!("CARGO_PKG_VERSION"));
