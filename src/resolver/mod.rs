//! Address resolution against the external geography service.
//!
//! A resolver performs exactly one lookup per call and never retries; the
//! coordinator decides when a key is looked up again.

mod http;

pub use http::{normalize_response, HttpResolver};

use async_trait::async_trait;

use crate::error_handling::LookupError;
use crate::geo::GeoRecord;

/// Looks up geographic metadata for one address.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Resolves `address`, failing if the service is unreachable, answers with
    /// an error, or returns no usable country code.
    async fn resolve(&self, address: &str) -> Result<GeoRecord, LookupError>;
}
