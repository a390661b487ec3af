//! Integration tests for the query surface
//!
//! Drives the real axum server over loopback with a reqwest client and
//! verifies endpoint behavior including the error paths.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use heatwatch::{
    actors::{fanout::FanoutHandle, poller::PollerHandle, store::StoreHandle},
    api::{spawn_api_server, ApiConfig, ApiState},
    upstream::OpenMeteoClient,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

struct TestHub {
    addr: SocketAddr,
    store: StoreHandle,
    fanout: FanoutHandle,
    poller: PollerHandle,
}

/// Full hub against a mock upstream, with the API bound to a random port.
async fn spawn_test_hub(mock_upstream: &MockServer) -> TestHub {
    let registry = single_point_registry();
    let provider = Arc::new(
        OpenMeteoClient::new(format!("{}/v1/forecast", mock_upstream.uri())).unwrap(),
    );
    let store = StoreHandle::spawn(50);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry.clone(),
        provider,
        store.clone(),
        fanout.clone(),
        5,
        Duration::from_secs(3600),
    );

    let state = ApiState::new(store.clone(), fanout.clone(), registry, 600);
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: true,
    };
    let addr = spawn_api_server(config, state).await.unwrap();

    TestHub {
        addr,
        store,
        fanout,
        poller,
    }
}

async fn get_json(addr: SocketAddr, path_and_query: &str) -> (u16, Value) {
    let response = reqwest::get(format!("http://{addr}{path_and_query}"))
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn points_endpoint_serves_full_and_base_catalogs() {
    let mock_upstream = MockServer::start().await;
    let hub = spawn_test_hub(&mock_upstream).await;

    let (status, body) = get_json(hub.addr, "/api/v1/points").await;
    assert_eq!(status, 200);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 3); // base + 2 synthetics
    assert_eq!(points[0]["id"], "karachi");
    assert_eq!(points[1]["isSynthetic"], true);
    assert_eq!(points[1]["baseId"], "karachi");

    let (status, body) = get_json(hub.addr, "/api/v1/points?scope=base").await;
    assert_eq!(status, 200);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["terrainClass"], "plain");

    let (status, body) = get_json(hub.addr, "/api/v1/points?scope=bogus").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("scope"));

    hub.poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn recent_events_endpoint_returns_newest_first() {
    let mock_upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(38.0, 55.0, 1)))
        .mount(&mock_upstream)
        .await;

    let hub = spawn_test_hub(&mock_upstream).await;
    hub.poller.poll_now().await.unwrap();

    let (status, body) = get_json(hub.addr, "/api/v1/events/recent").await;
    assert_eq!(status, 200);

    // Synthetic expansions are appended after the base event, so they come
    // back first in newest-first order
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["isSynthetic"], true);
    assert_eq!(events[2]["pointId"], "karachi");

    let (status, body) = get_json(hub.addr, "/api/v1/events/recent?limit=1").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);

    hub.poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn by_point_endpoint_handles_hits_misses_and_bad_input() {
    let mock_upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(41.0, 45.0, 1)))
        .mount(&mock_upstream)
        .await;

    let hub = spawn_test_hub(&mock_upstream).await;
    hub.poller.poll_now().await.unwrap();

    let (status, body) = get_json(hub.addr, "/api/v1/events/by-point?id=karachi").await;
    assert_eq!(status, 200);
    assert_eq!(body["pointId"], "karachi");
    assert_eq!(body["riskTier"], "danger");
    assert_eq!(body["isOfficialHeatwave"], true);

    // Name lookup is case-insensitive
    let (status, body) = get_json(hub.addr, "/api/v1/events/by-point?name=KARACHI").await;
    assert_eq!(status, 200);
    assert_eq!(body["pointId"], "karachi");

    let (status, _) = get_json(hub.addr, "/api/v1/events/by-point?id=atlantis").await;
    assert_eq!(status, 404);

    let (status, body) = get_json(hub.addr, "/api/v1/events/by-point").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("required"));

    hub.poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn health_endpoint_reports_counts_and_interval() {
    let mock_upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(30.0, 50.0, 1)))
        .mount(&mock_upstream)
        .await;

    let hub = spawn_test_hub(&mock_upstream).await;

    let _subscription = hub.fanout.subscribe().await.unwrap();
    hub.poller.poll_now().await.unwrap();

    // Let the store actor drain its append queue
    let _ = hub.store.count().await.unwrap();

    let (status, body) = get_json(hub.addr, "/api/v1/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 1);
    assert_eq!(body["stored_events"], 3);
    assert_eq!(body["poll_interval_secs"], 600);
    assert!(body["uptime_secs"].is_u64());

    hub.poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_store_serves_empty_recent_list() {
    let mock_upstream = MockServer::start().await;
    let hub = spawn_test_hub(&mock_upstream).await;

    let (status, body) = get_json(hub.addr, "/api/v1/events/recent?limit=500").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 0);

    hub.poller.shutdown().await.unwrap();
}
