//! HTTP client for the board manager
//!
//! [`UpstreamApi`] is the seam between the bridge and the board manager's
//! query endpoints. The state fetcher and the liveness monitor only ever see
//! this trait, so tests can swap in a scripted upstream.

use crate::config::UpstreamConfig;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpReply {
    /// Create a reply
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the upstream answered 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body parsed as a JSON object, if it is one
    pub fn json_object(&self) -> Option<Value> {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .filter(Value::is_object)
    }
}

/// Query interface of the board manager
///
/// Implementations must be `Send + Sync` so one client can be shared by the
/// stream pipeline and the liveness loop.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// GET a path relative to the board manager's base URL
    ///
    /// Any HTTP answer, including error statuses, is `Ok`. Transport failures
    /// and timeouts are `Err`.
    async fn get(&self, path: &str, timeout: Duration) -> Result<HttpReply>;
}

/// [`UpstreamApi`] over HTTP using reqwest
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    /// Build a client for the configured board manager
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BridgeError::from(e).with_context("Failed to build HTTP client"))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Full URL a GET for `path` is sent to
    pub fn url(&self, path: &str) -> String {
        self.config.state_url(path)
    }
}

#[async_trait]
impl UpstreamApi for HttpUpstream {
    async fn get(&self, path: &str, timeout: Duration) -> Result<HttpReply> {
        let url = self.url(path);
        let response = self.client.get(&url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}
