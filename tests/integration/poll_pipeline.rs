//! End-to-end pipeline tests against a mock upstream
//!
//! These exercise the real Open-Meteo client through wiremock: poll cycle →
//! upstream fetch → metric derivation → synthetic expansion → store +
//! broadcast.

use std::sync::Arc;
use std::time::Duration;

use heatwatch::{
    actors::{fanout::FanoutHandle, poller::PollerHandle, store::StoreHandle},
    registry::TerrainClass,
    upstream::OpenMeteoClient,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn forecast_url(mock: &MockServer) -> String {
    format!("{}/v1/forecast", mock.uri())
}

#[tokio::test]
async fn single_point_cycle_stores_base_and_synthetics() {
    let mock_server = MockServer::start().await;

    // Batch of one: provider answers with a bare object, not an array
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(36.0, 50.0, 1)))
        .mount(&mock_server)
        .await;

    let registry = single_point_registry();
    let provider = Arc::new(OpenMeteoClient::new(forecast_url(&mock_server)).unwrap());
    let store = StoreHandle::spawn(100);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry,
        provider,
        store.clone(),
        fanout,
        5,
        Duration::from_secs(3600),
    );

    let stats = poller.poll_now().await.unwrap();
    assert!(!stats.aborted);
    assert_eq!(stats.batches_total, 1);
    assert_eq!(stats.events_stored, 3); // base + 2 synthetics

    let events = store.recent(10).await.unwrap();
    assert_eq!(events.len(), 3);

    let base = events.iter().find(|e| !e.is_synthetic).unwrap();
    assert_eq!(base.point_id, "karachi");
    assert_eq!(base.temp_c, 36.0);
    assert_eq!(base.relative_humidity, 50.0);
    assert_eq!(base.is_daylight, Some(true));
    assert_eq!(base.humidity_sample_time.as_deref(), Some("2026-06-01T14:00"));
    // Registry coordinates rounded to exactly four decimals
    assert_eq!(base.lat, 24.8607);
    assert_eq!(base.lon, 67.0011);

    for synthetic in events.iter().filter(|e| e.is_synthetic) {
        assert!(synthetic.point_id.starts_with("karachi-s"));
        assert_eq!(synthetic.temp_c, base.temp_c);
        assert_eq!(synthetic.heat_index_c, base.heat_index_c);
        assert_eq!(synthetic.risk_tier, base.risk_tier);
    }

    poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn multi_point_batch_parses_array_response() {
    let mock_server = MockServer::start().await;

    // Batch of two: provider answers with an array, positionally aligned
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            forecast_json(41.0, 45.0, 1),
            forecast_json(22.0, 60.0, 0),
        ])))
        .mount(&mock_server)
        .await;

    let registry = test_registry(vec![
        base_point("karachi", "Karachi", 24.8607, 67.0011, TerrainClass::Plain),
        base_point("gilgit", "Gilgit", 35.9206, 74.3083, TerrainClass::Hilly),
    ]);
    let provider = Arc::new(OpenMeteoClient::new(forecast_url(&mock_server)).unwrap());
    let store = StoreHandle::spawn(100);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry,
        provider,
        store.clone(),
        fanout,
        5,
        Duration::from_secs(3600),
    );

    let stats = poller.poll_now().await.unwrap();
    assert_eq!(stats.events_stored, 6);

    let karachi = store.find_by_point_id_or_name("karachi").await.unwrap().unwrap();
    assert_eq!(karachi.temp_c, 41.0);
    assert!(karachi.is_official_heatwave);

    let gilgit = store.find_by_point_id_or_name("Gilgit").await.unwrap().unwrap();
    assert_eq!(gilgit.temp_c, 22.0);
    assert!(!gilgit.is_official_heatwave);
    assert_eq!(gilgit.is_daylight, Some(false));

    poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn qualifying_events_reach_subscribers_synthetics_never_do() {
    let mock_server = MockServer::start().await;

    // 41 °C / 45 % on a plain point: danger tier and official heatwave
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(41.0, 45.0, 1)))
        .mount(&mock_server)
        .await;

    let registry = single_point_registry();
    let provider = Arc::new(OpenMeteoClient::new(forecast_url(&mock_server)).unwrap());
    let store = StoreHandle::spawn(100);
    let fanout = FanoutHandle::spawn();
    let mut sub = fanout.subscribe().await.unwrap();

    let poller = PollerHandle::spawn(
        registry,
        provider,
        store.clone(),
        fanout.clone(),
        5,
        Duration::from_secs(3600),
    );

    let stats = poller.poll_now().await.unwrap();
    assert_eq!(stats.events_published, 1);

    // Welcome first, then exactly the base event
    let welcome: serde_json::Value = serde_json::from_str(&sub.rx.recv().await.unwrap()).unwrap();
    assert_eq!(welcome["type"], "welcome");

    let frame: serde_json::Value = serde_json::from_str(&sub.rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "heat_update");
    assert_eq!(frame["pointId"], "karachi");
    assert_eq!(frame["riskTier"], "danger");
    assert_eq!(frame["isOfficialHeatwave"], true);
    assert_eq!(frame["isSynthetic"], false);

    // Synthetic events were stored but never broadcast, despite carrying the
    // same qualifying tier
    let events = store.recent(10).await.unwrap();
    assert!(events.iter().any(|e| e.is_synthetic && e.qualifies_for_push()));
    assert!(
        tokio::time::timeout(Duration::from_millis(100), sub.rx.recv())
            .await
            .is_err(),
        "no further frames expected"
    );

    poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn cool_observation_is_stored_but_not_published() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(24.0, 55.0, 1)))
        .mount(&mock_server)
        .await;

    let registry = single_point_registry();
    let provider = Arc::new(OpenMeteoClient::new(forecast_url(&mock_server)).unwrap());
    let store = StoreHandle::spawn(100);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry,
        provider,
        store.clone(),
        fanout,
        5,
        Duration::from_secs(3600),
    );

    let stats = poller.poll_now().await.unwrap();
    assert_eq!(stats.events_stored, 3);
    assert_eq!(stats.events_published, 0);

    let base = store.find_by_point_id_or_name("karachi").await.unwrap().unwrap();
    assert_eq!(base.risk_tier.as_str(), "none");
    // The map still gets a visible floor weight
    assert!(base.heat_weight > 0.0);

    poller.shutdown().await.unwrap();
}

#[tokio::test]
async fn repeated_cycles_respect_store_capacity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(30.0, 50.0, 1)))
        .mount(&mock_server)
        .await;

    let registry = single_point_registry();
    let provider = Arc::new(OpenMeteoClient::new(forecast_url(&mock_server)).unwrap());
    // Capacity below one cycle's output (3 events per cycle)
    let store = StoreHandle::spawn(4);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry,
        provider,
        store.clone(),
        fanout,
        5,
        Duration::from_secs(3600),
    );

    for _ in 0..3 {
        poller.poll_now().await.unwrap();
    }

    let events = store.recent(100).await.unwrap();
    assert_eq!(events.len(), 4);

    poller.shutdown().await.unwrap();
}
