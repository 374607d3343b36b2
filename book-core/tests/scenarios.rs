//! End-to-end scenarios driving the engine through [`MockAdapter`] rather than a real
//! exchange connection.

use std::time::Duration;

use book_core::config::{EngineConfig, Exchange};
use book_core::testing::{crossed_snapshot_batch, healthy_snapshot_batch, test_market, MockAdapter};
use book_core::Engine;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn scenario_fresh_engine_reports_initialising_before_any_batch() {
    let market = test_market();
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        MockAdapter::new(),
    );

    settle().await;
    let err = engine.top_asks(&market, 5, None).unwrap_err();
    assert!(err.is_out_of_sync());
    assert!(!engine.initialisation_completed());
}

#[tokio::test]
async fn scenario_snapshot_promotes_market_to_active_and_levels_are_queryable() {
    let market = test_market();
    let mut adapter = MockAdapter::new();
    adapter.push_batch(healthy_snapshot_batch(&market));
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        adapter,
    );

    settle().await;
    assert!(tokio::time::timeout(Duration::from_secs(1), engine.complete_initialisation())
        .await
        .unwrap());

    let asks = engine.top_asks(&market, 2, None).unwrap();
    assert_eq!(asks.len(), 2);
    assert!(asks[0].0 < asks[1].0);

    let mid = engine.middle(&market, None).unwrap();
    assert!(mid > 0.0);
}

#[tokio::test]
async fn scenario_crossed_book_surfaces_as_inconsistent_and_requests_restart() {
    let market = test_market();
    let mut adapter = MockAdapter::new();
    adapter.push_batch(crossed_snapshot_batch(&market));
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        adapter,
    );

    settle().await;
    let err = engine.top_bids(&market, 5, None).unwrap_err();
    assert!(err.is_out_of_sync());
}

#[tokio::test]
async fn scenario_depth_queries_reflect_only_present_levels() {
    let market = test_market();
    let mut adapter = MockAdapter::new();
    adapter.push_batch(healthy_snapshot_batch(&market));
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        adapter,
    );

    settle().await;
    assert_eq!(engine.ask_depth_at(&market, 0.051, None).unwrap(), 1.0);
    assert_eq!(engine.ask_depth_at(&market, 0.999, None).unwrap(), 0.0);
}

#[tokio::test]
async fn scenario_unconfigured_market_is_a_structural_error_not_a_retry_signal() {
    let market = test_market();
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market]),
        MockAdapter::new(),
    );

    let unknown = book_core::MarketKey::new("xrp", "usd");
    let err = engine.top_asks(&unknown, 5, None).unwrap_err();
    assert!(!err.is_out_of_sync());
}

#[tokio::test]
async fn scenario_reconnect_after_transient_connect_failures_still_reaches_active() {
    let market = test_market();
    let mut adapter = MockAdapter::new();
    adapter.fail_connects(2);
    adapter.push_batch(healthy_snapshot_batch(&market));
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        adapter,
    );

    settle().await;
    assert!(tokio::time::timeout(Duration::from_secs(1), engine.complete_initialisation())
        .await
        .unwrap());
}

#[tokio::test]
async fn scenario_heartbeat_staleness_fails_queries_once_the_window_elapses() {
    let market = test_market();
    let mut adapter = MockAdapter::new();
    adapter.push_batch(healthy_snapshot_batch(&market));
    let engine = Engine::spawn(
        EngineConfig::new(Exchange::Bitfinex, vec![market.clone()]),
        adapter,
    );

    settle().await;
    let window = Some(Duration::from_millis(30));
    assert!(engine.middle(&market, window).is_ok());

    tokio::time::sleep(Duration::from_millis(60)).await;
    let err = engine.middle(&market, window).unwrap_err();
    assert!(err.is_out_of_sync());

    // The engine's own default window (10s) is unaffected by the per-call override above.
    assert!(engine.middle(&market, None).is_ok());
}
