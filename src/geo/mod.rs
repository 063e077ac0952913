//! Geographic record types shared by every tier of the cache.

mod types;

pub use types::{GeoRecord, GeoTimezone};
