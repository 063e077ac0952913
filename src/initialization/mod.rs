//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - HTTP client for lookups
//! - Durable store selected on the command line
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod store;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use store::init_store;
