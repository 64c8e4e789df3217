//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use crossbeam_channel::Receiver;
use dartbridge::Published;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Wait for the next published message matching `pred`
///
/// Non-matching messages are discarded. Works with paused tokio time.
pub async fn recv_matching<F>(rx: &Receiver<Published>, mut pred: F) -> Option<Published>
where
    F: FnMut(&Published) -> bool,
{
    let deadline = tokio::time::Instant::now() + test_timeout();
    while tokio::time::Instant::now() < deadline {
        while let Ok(message) = rx.try_recv() {
            if pred(&message) {
                return Some(message);
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

/// Wait for the next telemetry payload
pub async fn next_telemetry(rx: &Receiver<Published>) -> Option<serde_json::Value> {
    match recv_matching(rx, |m| matches!(m, Published::Telemetry(_))).await {
        Some(Published::Telemetry(payload)) => Some(payload),
        _ => None,
    }
}
