//! State fetcher
//!
//! After a throw event the board needs a moment to settle its detection.
//! The fetcher waits for that, then asks the board manager for the current
//! game state, walking the configured candidate paths in order until one of
//! them answers 200 with a JSON object. Every failure turns into `None`; the
//! caller simply skips that event.

use crate::config::UpstreamConfig;
use crate::error::{BridgeError, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::client::UpstreamApi;

/// Pulls the authoritative game state from the board manager
#[derive(Clone)]
pub struct StateFetcher {
    api: Arc<dyn UpstreamApi>,
    paths: Vec<String>,
    settle_delay: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for StateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateFetcher")
            .field("paths", &self.paths)
            .field("settle_delay", &self.settle_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StateFetcher {
    /// Create a fetcher trying `paths` in order
    pub fn new(
        api: Arc<dyn UpstreamApi>,
        paths: Vec<String>,
        settle_delay: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            api,
            paths,
            settle_delay,
            timeout,
        }
    }

    /// Create a fetcher from the upstream configuration
    pub fn from_config(api: Arc<dyn UpstreamApi>, config: &UpstreamConfig) -> Self {
        Self::new(
            api,
            config.state_paths.clone(),
            config.settle_delay(),
            config.request_timeout(),
        )
    }

    /// Candidate paths, primary first
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Wait for the board to settle, then fetch the game state
    pub async fn fetch(&self) -> Option<Value> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        self.fetch_now().await
    }

    /// Fetch the game state without the settle delay
    pub async fn fetch_now(&self) -> Option<Value> {
        for path in &self.paths {
            match self.fetch_path(path).await {
                Ok(state) => {
                    tracing::debug!(path = %path, "Fetched game state");
                    return Some(state);
                }
                Err(e) => tracing::debug!(path = %path, "State request failed: {}", e),
            }
        }

        tracing::warn!(
            candidates = self.paths.len(),
            "No state endpoint answered; skipping throw event"
        );
        None
    }

    /// Fetch the game state from a single path
    pub async fn fetch_path(&self, path: &str) -> Result<Value> {
        let reply = self.api.get(path, self.timeout).await?;
        if !reply.is_ok() {
            return Err(BridgeError::Status {
                status: reply.status,
                path: path.to_string(),
            });
        }
        reply
            .json_object()
            .ok_or_else(|| {
                BridgeError::Payload(format!("state body from {} is not a JSON object", path))
            })
    }
}
