//! Mock construction helpers
//!
//! Built on the public seams only, so integration tests run without the
//! `mock-upstream` feature.

use async_trait::async_trait;
use dartbridge::upstream::{HttpReply, MessageStream, StreamConnector, UpstreamApi};
use dartbridge::{BridgeError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Upstream whose replies can be changed while the bridge runs
///
/// Paths without a reply fail like an unreachable host.
#[derive(Clone, Default)]
pub struct SwitchableUpstream {
    replies: Arc<Mutex<HashMap<String, HttpReply>>>,
}

impl SwitchableUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: &str, status: u16, body: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), HttpReply::new(status, body));
    }

    /// Make every path unreachable
    pub fn go_dark(&self) {
        self.replies.lock().unwrap().clear();
    }
}

#[async_trait]
impl UpstreamApi for SwitchableUpstream {
    async fn get(&self, path: &str, _timeout: Duration) -> Result<HttpReply> {
        let reply = self.replies.lock().unwrap().get(path).cloned();
        reply.ok_or_else(|| {
            BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "board unreachable",
            ))
        })
    }
}

/// Connector whose single session is fed by the test
///
/// Later connects yield streams that stay silent.
pub struct FeedConnector {
    feed: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

/// Create a connector and the sender feeding its stream
pub fn create_feed_connector() -> (FeedConnector, mpsc::UnboundedSender<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connector = FeedConnector {
        feed: Mutex::new(Some(rx)),
    };
    (connector, tx)
}

#[async_trait]
impl StreamConnector for FeedConnector {
    async fn connect(&self) -> Result<Box<dyn MessageStream>> {
        let feed = self.feed.lock().unwrap().take();
        Ok(Box::new(FeedStream { feed }))
    }

    fn endpoint(&self) -> String {
        "test://feed".to_string()
    }
}

struct FeedStream {
    feed: Option<mpsc::UnboundedReceiver<String>>,
}

#[async_trait]
impl MessageStream for FeedStream {
    async fn next_text(&mut self) -> Option<Result<String>> {
        match &mut self.feed {
            Some(feed) => feed.recv().await.map(Ok),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

/// A `motion_state` stream message
pub fn motion_message() -> String {
    r#"{"type":"motion_state","data":{"motion":false}}"#.to_string()
}
