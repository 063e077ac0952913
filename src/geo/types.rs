//! Geo data structures.
//!
//! `GeoRecord` is both the value handed to consumers and the shape persisted in
//! the durable snapshot. Field names on the wire follow the lookup service
//! (`country`, `abbr`, `utc`, `current_time`) so existing snapshots stay
//! readable.

use serde::{Deserialize, Serialize};

use crate::config::FLAG_CDN_BASE;

/// Timezone metadata for a resolved address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoTimezone {
    /// Region/city identifier, e.g. `America/Los_Angeles`
    #[serde(default)]
    pub id: String,
    /// Abbreviation, e.g. `PST`
    #[serde(rename = "abbr", default)]
    pub abbreviation: String,
    /// UTC offset, e.g. `-08:00`
    #[serde(rename = "utc", default)]
    pub utc_offset: String,
    /// Local time at lookup, as returned by the service. Does not tick.
    #[serde(rename = "current_time", default)]
    pub current_local_time: String,
}

/// Resolved geographic and timezone metadata for one address.
///
/// Immutable once created; shared as `Arc<GeoRecord>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,
    /// Country display name
    #[serde(rename = "country", default)]
    pub country_name: String,
    /// City name, may be empty
    #[serde(default)]
    pub city: String,
    /// Region or state, may be empty
    #[serde(default)]
    pub region: String,
    /// Timezone metadata
    #[serde(default)]
    pub timezone: GeoTimezone,
}

impl GeoRecord {
    /// Flag image URL for the record's country at the given pixel width.
    pub fn flag_url(&self, width: u32) -> String {
        format!(
            "{}/w{}/{}.png",
            FLAG_CDN_BASE,
            width,
            self.country_code.to_lowercase()
        )
    }

    /// `"City, Country"`, skipping whichever part is empty.
    pub fn display_location(&self) -> String {
        [self.city.as_str(), self.country_name.as_str()]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wall-clock part (`HH:MM:SS`) of the local time snapshot.
    ///
    /// Returns `None` when the snapshot has no `T` separator.
    pub fn local_clock(&self) -> Option<&str> {
        let (_, time) = self.timezone.current_local_time.split_once('T')?;
        let end = time.find(['+', '-', 'Z']).unwrap_or(time.len());
        let clock = &time[..end];
        (!clock.is_empty()).then_some(clock)
    }

    /// Whether the record carries a usable country code.
    pub(crate) fn has_country_code(&self) -> bool {
        !self.country_code.trim().is_empty()
    }
}
