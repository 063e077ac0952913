//! HTTP client initialization.

use crate::config::GeoCacheConfig;
use reqwest::ClientBuilder;

/// Initializes the HTTP client used for geography lookups.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the config
/// - Total request timeout equal to the lookup timeout, so a stalled service
///   surfaces as a lookup failure instead of a hung pending request
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &GeoCacheConfig) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.lookup_timeout)
        .connect_timeout(config.lookup_timeout)
        .user_agent(config.user_agent.clone())
        .build()
}
