//! Integration tests for the throw pipeline
//!
//! Runs a complete bridge against a fed event stream and a switchable
//! upstream, and checks what reaches the publisher.

mod common;

use common::builders::{test_config, GameStateBuilder};
use common::mock_helpers::{create_feed_connector, motion_message, SwitchableUpstream};
use common::{assert_float_eq, next_telemetry, recv_matching};
use dartbridge::{Bridge, ChannelPublisher, LinkStatus, Published};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_visit_progression_and_maximum() {
    let upstream = SwitchableUpstream::new();
    let (connector, feed) = create_feed_connector();
    let (publisher, rx) = ChannelPublisher::new();
    let bridge = Bridge::new(
        &test_config(),
        Arc::new(upstream.clone()),
        Arc::new(connector),
        Arc::new(publisher),
    );
    let context = bridge.context();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(bridge.run(cancel.clone()));

    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new().scores(&[441]).throw(20, 3).body(),
    );
    feed.send(motion_message()).unwrap();
    let first = next_telemetry(&rx).await.expect("first dart");
    assert_eq!(first["summary"], "T20 | M | M");
    assert_eq!(first["number_of_throws"], 1);
    assert_float_eq(first["leg_average"].as_f64().unwrap(), 180.0, 0.001);

    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new()
            .scores(&[381])
            .throw(20, 3)
            .throw(20, 3)
            .body(),
    );
    feed.send(motion_message()).unwrap();
    let second = next_telemetry(&rx).await.expect("second dart");
    assert_eq!(second["total"], 120);
    assert_eq!(second["is_180"], false);

    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new()
            .scores(&[321])
            .throw(20, 3)
            .throw(20, 3)
            .throw(20, 3)
            .body(),
    );
    // junk on the stream must not stop the adapter
    feed.send("{not json".to_string()).unwrap();
    feed.send(r#"{"type":"event","data":{}}"#.to_string()).unwrap();
    feed.send(motion_message()).unwrap();
    let third = next_telemetry(&rx).await.expect("third dart");
    assert_eq!(third["is_180"], true);
    assert_eq!(third["total"], 180);
    assert_float_eq(third["three_dart_average"].as_f64().unwrap(), 60.0, 0.001);
    assert_float_eq(third["leg_average"].as_f64().unwrap(), 180.0, 0.001);
    assert_eq!(third["remaining"], 321);
    assert_eq!(third["board_status"], "Throw");

    assert_eq!(context.session().totals(), (180, 3));

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fallback_state_path() {
    let mut config = test_config();
    config.upstream.state_paths = vec!["/api/state".to_string(), "/api/game".to_string()];

    let upstream = SwitchableUpstream::new();
    upstream.set("/api/state", 500, "internal error");
    upstream.set(
        "/api/game",
        200,
        GameStateBuilder::new().scores(&[32]).throw(16, 2).body(),
    );
    let (connector, feed) = create_feed_connector();
    let (publisher, rx) = ChannelPublisher::new();
    let bridge = Bridge::new(
        &config,
        Arc::new(upstream),
        Arc::new(connector),
        Arc::new(publisher),
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(bridge.run(cancel.clone()));

    feed.send(motion_message()).unwrap();
    let record = next_telemetry(&rx).await.expect("record from fallback path");
    assert_eq!(record["dart1"], "D16");
    assert_eq!(record["remaining"], 32);
    assert_eq!(record["checkout_possible"], true);
    assert_eq!(record["board_status"], "TakeoutInProgress");

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_leg_win_starts_fresh_leg() {
    let upstream = SwitchableUpstream::new();
    let (connector, feed) = create_feed_connector();
    let (publisher, rx) = ChannelPublisher::new();
    let bridge = Bridge::new(
        &test_config(),
        Arc::new(upstream.clone()),
        Arc::new(connector),
        Arc::new(publisher),
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(bridge.run(cancel.clone()));

    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new()
            .scores(&[0])
            .throw(20, 1)
            .throw(20, 2)
            .winner(0)
            .body(),
    );
    feed.send(motion_message()).unwrap();
    let win = next_telemetry(&rx).await.expect("winning record");
    assert_eq!(win["leg_result"], "win");
    assert_eq!(win["board_status"], "Takeout");
    assert_float_eq(win["leg_average"].as_f64().unwrap(), 90.0, 0.001);

    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new().scores(&[496]).throw(5, 1).body(),
    );
    feed.send(motion_message()).unwrap();
    let next_leg = next_telemetry(&rx).await.expect("first record of next leg");
    assert_eq!(next_leg["leg_result"], "playing");
    assert_float_eq(next_leg["leg_average"].as_f64().unwrap(), 15.0, 0.001);

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_announces_offline() {
    let upstream = SwitchableUpstream::new();
    upstream.set("/api/state", 200, "{}");
    let (connector, _feed) = create_feed_connector();
    let (publisher, rx) = ChannelPublisher::new();
    let bridge = Bridge::new(
        &test_config(),
        Arc::new(upstream),
        Arc::new(connector),
        Arc::new(publisher),
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(bridge.run(cancel.clone()));

    assert_eq!(
        recv_matching(&rx, |m| matches!(m, Published::Status(_))).await,
        Some(Published::Status(LinkStatus::Online))
    );

    cancel.cancel();
    task.await.unwrap().unwrap();

    let remaining: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        remaining[remaining.len() - 2..],
        [Published::Status(LinkStatus::Offline), Published::Shutdown]
    );
}

#[tokio::test(start_paused = true)]
async fn test_running_fetch_finishes_before_goodbye() {
    let mut config = test_config();
    config.upstream.settle_delay_ms = 300;

    let upstream = SwitchableUpstream::new();
    upstream.set(
        "/api/state",
        200,
        GameStateBuilder::new().scores(&[441]).throw(20, 3).body(),
    );
    let (connector, feed) = create_feed_connector();
    let (publisher, rx) = ChannelPublisher::new();
    let bridge = Bridge::new(
        &config,
        Arc::new(upstream),
        Arc::new(connector),
        Arc::new(publisher),
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(bridge.run(cancel.clone()));

    feed.send(motion_message()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    task.await.unwrap().unwrap();

    let published: Vec<_> = rx.try_iter().collect();
    assert_eq!(published.last(), Some(&Published::Shutdown));
    let shutdown_at = published.len() - 1;
    let telemetry_at = published
        .iter()
        .position(|m| matches!(m, Published::Telemetry(_)))
        .expect("the running fetch still publishes");
    assert!(telemetry_at < shutdown_at);
    assert_eq!(
        published[shutdown_at - 1],
        Published::Status(LinkStatus::Offline)
    );
}
