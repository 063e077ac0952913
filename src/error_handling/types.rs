//! Error type definitions.
//!
//! This module defines the error and event types used throughout the geo cache.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error opening the durable store.
    #[error("Store initialization error: {0}")]
    StoreError(#[from] StoreError),
}

/// Failure of a single geography lookup.
///
/// Every variant is absorbed by the coordinator and surfaces to consumers only
/// as "no data"; the variants exist for logging and statistics.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Connection, DNS or body read failure.
    #[error("Lookup transport error: {0}")]
    Transport(#[from] ReqwestError),

    /// The lookup did not finish within the configured bound.
    #[error("Lookup timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The service answered with a non-success HTTP status.
    #[error("Lookup service returned HTTP {0}")]
    Status(u16),

    /// The body was not JSON or lacked a usable country code.
    #[error("Malformed lookup response: {0}")]
    MalformedResponse(String),

    /// The service reported `success: false` for the address.
    #[error("Lookup rejected by service: {0}")]
    Rejected(String),

    /// The lookup URL could not be built from the base and address.
    #[error("Invalid lookup URL: {0}")]
    InvalidUrl(String),
}

/// Error types for durable store operations.
///
/// Unparsable content is not an error: it degrades to an empty snapshot when
/// loading. These variants cover I/O that genuinely failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem read or write failure.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// The snapshot could not be serialized.
    #[error("Store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Cache events tracked by `CacheStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum CacheEvent {
    /// Request answered from the hot cache
    HotHit,
    /// Request answered by a record hydrated from the durable store
    DurableHit,
    /// A resolver call was started
    LookupStarted,
    /// A request attached to an existing pending lookup
    Coalesced,
    /// A resolver call produced a record
    LookupSucceeded,
    /// A resolver call failed or timed out
    LookupFailed,
    /// The durable snapshot was written
    StoreWrite,
    /// Writing the durable snapshot failed
    StoreWriteFailed,
    /// The durable snapshot could not be parsed and was ignored
    StoreCorruption,
    /// An entry was evicted because the capacity was reached
    Evicted,
}

impl std::fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CacheEvent {
    /// Human-readable event name used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEvent::HotHit => "hot cache hit",
            CacheEvent::DurableHit => "durable store hit",
            CacheEvent::LookupStarted => "lookup started",
            CacheEvent::Coalesced => "coalesced request",
            CacheEvent::LookupSucceeded => "lookup succeeded",
            CacheEvent::LookupFailed => "lookup failed",
            CacheEvent::StoreWrite => "store write",
            CacheEvent::StoreWriteFailed => "store write failed",
            CacheEvent::StoreCorruption => "store corruption",
            CacheEvent::Evicted => "evicted",
        }
    }
}
