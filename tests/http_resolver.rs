//! HTTP resolver against a mock lookup service.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use helpers::within_5s;
use serde_json::json;
use server_geo::initialization::init_client;
use server_geo::{
    GeoCacheConfig, GeoCoordinator, GeoResolver, HttpResolver, LookupError, MemoryStore,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIELDS: &str = "country,country_code,city,region,timezone";

fn google_dns_body() -> serde_json::Value {
    json!({
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
    })
}

fn config_for(server: &MockServer, timeout: Duration) -> GeoCacheConfig {
    GeoCacheConfig {
        service_base: server.uri(),
        lookup_timeout: timeout,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_resolves_full_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/8.8.8.8"))
        .and(query_param("fields", FIELDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_dns_body()))
        .expect(1)
        .mount(&server)
        .await;

    let resolver =
        HttpResolver::new(&config_for(&server, Duration::from_secs(2))).expect("resolver");
    let record = resolver.resolve("8.8.8.8").await.expect("record");

    assert_eq!(record.country_code, "US");
    assert_eq!(record.country_name, "United States");
    assert_eq!(record.region, "California");
    assert_eq!(record.timezone.abbreviation, "PDT");
    assert_eq!(record.local_clock(), Some("09:15:30"));
}

#[tokio::test]
async fn test_non_success_status_is_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver =
        HttpResolver::new(&config_for(&server, Duration::from_secs(2))).expect("resolver");
    let err = resolver.resolve("8.8.8.8").await.expect_err("must fail");
    assert!(matches!(err, LookupError::Status(404)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_country_code_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"country": "United States", "city": "Mountain View"})),
        )
        .mount(&server)
        .await;

    let resolver =
        HttpResolver::new(&config_for(&server, Duration::from_secs(2))).expect("resolver");
    let err = resolver.resolve("8.8.8.8").await.expect_err("must fail");
    assert!(matches!(err, LookupError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_service_rejection_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Reserved range"})),
        )
        .mount(&server)
        .await;

    let resolver =
        HttpResolver::new(&config_for(&server, Duration::from_secs(2))).expect("resolver");
    let err = resolver.resolve("10.0.0.1").await.expect_err("must fail");
    assert!(matches!(err, LookupError::Rejected(ref m) if m == "Reserved range"));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(google_dns_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server, Duration::from_millis(200));
    let client = init_client(&config).expect("client");
    let resolver = HttpResolver::with_client(client, &server.uri(), config.lookup_timeout);
    let err = within_5s(resolver.resolve("8.8.8.8"))
        .await
        .expect_err("must time out");
    assert!(matches!(err, LookupError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };
    let uri = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let resolver = HttpResolver::with_client(client, &uri, Duration::from_secs(2));
    let err = within_5s(resolver.resolve("8.8.8.8"))
        .await
        .expect_err("must fail");
    assert!(
        matches!(err, LookupError::Transport(_) | LookupError::Timeout(_)),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_coordinator_sends_one_request_for_concurrent_callers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/8.8.8.8"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(google_dns_body())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let geo = GeoCoordinator::with_http_resolver(
        &config_for(&server, Duration::from_secs(2)),
        Arc::new(MemoryStore::new()),
    )
    .expect("coordinator");

    let results = within_5s(join_all((0..5).map(|_| geo.request("8.8.8.8")))).await;
    for result in results {
        assert_eq!(result.expect("record").country_code, "US");
    }
    assert_eq!(geo.cached("8.8.8.8").expect("cached").city, "Mountain View");
}

#[tokio::test]
async fn test_coordinator_does_not_cache_missing_country_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"country": ""})))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let geo = GeoCoordinator::with_http_resolver(
        &config_for(&server, Duration::from_secs(2)),
        store.clone(),
    )
    .expect("coordinator");

    assert!(geo.request("8.8.8.8").await.is_none());
    assert!(geo.cached("8.8.8.8").is_none());
    assert!(geo.request("8.8.8.8").await.is_none());
    geo.flush().await;
    assert!(store.raw().is_none());
}
