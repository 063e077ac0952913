//! HTTP resolver for ipwho.is-compatible services.
//!
//! Request: `GET <base>/<address>?fields=country,country_code,city,region,timezone`.
//! The response is accepted only if it carries a non-blank `country_code`;
//! anything else is a lookup failure and is never cached.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::GeoResolver;
use crate::config::{GeoCacheConfig, GEO_LOOKUP_FIELDS};
use crate::error_handling::{InitializationError, LookupError};
use crate::geo::{GeoRecord, GeoTimezone};
use crate::initialization::init_client;

/// Raw service response. Every field is optional; validation happens in
/// [`normalize_response`].
#[derive(Debug, Deserialize)]
struct LookupResponse {
    success: Option<bool>,
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    city: Option<String>,
    region: Option<String>,
    timezone: Option<GeoTimezone>,
}

/// Validates and converts a response body into a `GeoRecord`.
pub fn normalize_response(body: &str) -> Result<GeoRecord, LookupError> {
    let response: LookupResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if response.success == Some(false) {
        return Err(LookupError::Rejected(
            response
                .message
                .unwrap_or_else(|| "no reason given".to_string()),
        ));
    }

    let country_code = response
        .country_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| LookupError::MalformedResponse("missing country_code".to_string()))?;

    Ok(GeoRecord {
        country_code,
        country_name: response.country.unwrap_or_default(),
        city: response.city.unwrap_or_default(),
        region: response.region.unwrap_or_default(),
        timezone: response.timezone.unwrap_or_default(),
    })
}

/// Resolver backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl HttpResolver {
    /// Builds a resolver with its own client, configured from `config`.
    pub fn new(config: &GeoCacheConfig) -> Result<Self, InitializationError> {
        let client = init_client(config)?;
        Ok(Self::with_client(
            client,
            &config.service_base,
            config.lookup_timeout,
        ))
    }

    /// Builds a resolver around an existing client.
    ///
    /// `timeout` is only used to label timeout errors; the client's own
    /// timeout is what bounds the request.
    pub fn with_client(client: reqwest::Client, base: &str, timeout: Duration) -> Self {
        Self {
            client,
            base: base.to_string(),
            timeout,
        }
    }

    /// Builds the lookup URL, encoding the address as a single path segment.
    pub fn lookup_url(&self, address: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| LookupError::InvalidUrl(format!("{}: {}", self.base, e)))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .push(address);
        url.set_query(Some(&format!("fields={}", GEO_LOOKUP_FIELDS)));
        Ok(url)
    }
}

#[async_trait]
impl GeoResolver for HttpResolver {
    async fn resolve(&self, address: &str) -> Result<GeoRecord, LookupError> {
        let url = self.lookup_url(address)?;
        log::debug!("Looking up geo data for {} via {}", address, url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout(self.timeout)
            } else {
                LookupError::Transport(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout(self.timeout)
            } else {
                LookupError::Transport(e)
            }
        })?;
        normalize_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(base: &str) -> HttpResolver {
        HttpResolver::with_client(reqwest::Client::new(), base, Duration::from_secs(1))
    }

    #[test]
    fn test_normalize_full_response() {
        let body = r#"{
            "country": "United States",
            "country_code": "US",
            "city": "Mountain View",
            "region": "California",
            "timezone": {
                "id": "America/Los_Angeles",
                "abbr": "PDT",
                "is_dst": true,
                "offset": -25200,
                "utc": "-07:00",
                "current_time": "2024-06-01T09:15:30-07:00"
            }
        }"#;
        let record = normalize_response(body).expect("valid response");
        assert_eq!(record.country_code, "US");
        assert_eq!(record.country_name, "United States");
        assert_eq!(record.city, "Mountain View");
        assert_eq!(record.timezone.id, "America/Los_Angeles");
        assert_eq!(record.timezone.abbreviation, "PDT");
        assert_eq!(record.timezone.utc_offset, "-07:00");
    }

    #[test]
    fn test_normalize_missing_country_code() {
        let err = normalize_response(r#"{"country":"United States","city":"Mountain View"}"#)
            .expect_err("must fail");
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[test]
    fn test_normalize_blank_country_code() {
        let err = normalize_response(r#"{"country_code":"  "}"#).expect_err("must fail");
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[test]
    fn test_normalize_rejected() {
        let err = normalize_response(r#"{"success":false,"message":"Invalid IP address"}"#)
            .expect_err("must fail");
        match err {
            LookupError::Rejected(message) => assert_eq!(message, "Invalid IP address"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_normalize_invalid_json() {
        let err = normalize_response("<html>rate limited</html>").expect_err("must fail");
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[test]
    fn test_lookup_url() {
        let url = resolver("https://ipwho.is").lookup_url("8.8.8.8").expect("url");
        assert_eq!(
            url.as_str(),
            "https://ipwho.is/8.8.8.8?fields=country,country_code,city,region,timezone"
        );
    }

    #[test]
    fn test_lookup_url_keeps_base_path() {
        let url = resolver("http://localhost:8080/geo/")
            .lookup_url("1.1.1.1")
            .expect("url");
        assert_eq!(url.path(), "/geo/1.1.1.1");
    }

    #[test]
    fn test_lookup_url_encodes_separators() {
        let url = resolver("https://ipwho.is").lookup_url("a/b?c").expect("url");
        assert_eq!(url.path(), "/a%2Fb%3Fc");
    }

    #[test]
    fn test_lookup_url_invalid_base() {
        let err = resolver("not a url").lookup_url("8.8.8.8").expect_err("must fail");
        assert!(matches!(err, LookupError::InvalidUrl(_)));
    }
}
