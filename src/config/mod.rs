//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, service location, store identifiers)
//! - Library configuration (`GeoCacheConfig`)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{GeoCacheConfig, LogFormat, LogLevel, Opt, OutputFormat, StoreKind};
