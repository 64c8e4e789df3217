//! Event source adapter
//!
//! Keeps a WebSocket subscription to the board manager's push channel open
//! for the lifetime of the process. Text messages are classified into
//! [`StreamEvent`]s and handed to an [`EventHandler`], which decides what to
//! do (`on_event`) and then does it (`execute`).
//!
//! # Lifecycle
//!
//! ```text
//! Connecting --handshake--> Streaming --close/error--> Backoff --delay--> Connecting
//! ```
//!
//! The current [`StreamState`] is published on a `tokio::sync::watch`
//! channel. Failures never leave the loop; only cancellation does.
//!
//! # Dispatch
//!
//! At most one action runs at a time. A throw event that arrives while the
//! previous one is still being fetched and published is dropped; the next
//! motion event re-reports the whole visit anyway. An action still running
//! when the adapter is cancelled is awaited before `run` returns.

use crate::error::{BridgeError, Result};
use crate::types::StreamState;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Message type that signals a throw
pub const MOTION_STATE: &str = "motion_state";

/// Upper bound on the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ==================== Events ====================

/// A message received on the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The board saw motion; a throw may have landed
    MotionState,
    /// Any other message type (empty when the message has no type)
    Other(String),
}

/// What the handler wants done for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch the game state and publish a telemetry record
    FetchAndPublish,
    /// Nothing to do
    Ignore,
}

/// Parse one text frame from the stream
pub fn classify_message(text: &str) -> Result<StreamEvent> {
    let message: Value = serde_json::from_str(text)?;
    if !message.is_object() {
        return Err(BridgeError::Payload(format!(
            "stream message is not an object: {}",
            text
        )));
    }

    match message.get("type").and_then(Value::as_str) {
        Some(MOTION_STATE) => Ok(StreamEvent::MotionState),
        Some(other) => Ok(StreamEvent::Other(other.to_string())),
        None => Ok(StreamEvent::Other(String::new())),
    }
}

/// Receives classified stream events
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Decide what an event calls for
    fn on_event(&self, event: &StreamEvent) -> Action;

    /// Carry out a decided action
    async fn execute(&self, action: Action);
}

// ==================== Transport ====================

/// An open event stream
#[async_trait]
pub trait MessageStream: Send {
    /// Next text message; `None` once the peer closed the stream
    async fn next_text(&mut self) -> Option<Result<String>>;

    /// Close the stream
    async fn close(&mut self);
}

/// Opens event streams
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Connect and complete the handshake
    async fn connect(&self) -> Result<Box<dyn MessageStream>>;

    /// Where this connector connects to, for logging
    fn endpoint(&self) -> String;
}

/// [`StreamConnector`] for the board manager's WebSocket
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the handshake timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn MessageStream>> {
        let handshake = tokio_tungstenite::connect_async(self.url.as_str());
        let (socket, _response) = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| {
                BridgeError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("WebSocket handshake with {} timed out", self.url),
                ))
            })??;
        Ok(Box::new(WsStream { socket }))
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// [`MessageStream`] over tokio-tungstenite
pub struct WsStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl MessageStream for WsStream {
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Event stream closed by peer");
                    return None;
                }
                // Ping, pong and binary frames carry no events
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.socket.close(None).await {
            tracing::debug!(?err, "Error closing event stream");
        }
    }
}

// ==================== Adapter ====================

/// Supervises the event stream and dispatches its events
pub struct EventSourceAdapter {
    connector: Arc<dyn StreamConnector>,
    handler: Arc<dyn EventHandler>,
    reconnect_delay: Duration,
    state_tx: watch::Sender<StreamState>,
    in_flight: Arc<AtomicBool>,
    actions: TaskTracker,
}

impl EventSourceAdapter {
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        handler: Arc<dyn EventHandler>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(StreamState::default());
        Self {
            connector,
            handler,
            reconnect_delay,
            state_tx,
            in_flight: Arc::new(AtomicBool::new(false)),
            actions: TaskTracker::new(),
        }
    }

    /// Subscribe to stream state changes
    pub fn state(&self) -> watch::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    /// Run until `cancel` fires and the running action has finished
    pub async fn run(&self, cancel: CancellationToken) {
        let endpoint = self.connector.endpoint();
        tracing::info!(endpoint = %endpoint, "Event source adapter started");

        loop {
            self.set_state(StreamState::Connecting);
            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(mut stream) => {
                    self.set_state(StreamState::Streaming);
                    tracing::info!(endpoint = %endpoint, "Event stream connected");

                    if self.pump(stream.as_mut(), &cancel).await {
                        stream.close().await;
                        break;
                    }
                    tracing::warn!(endpoint = %endpoint, "Event stream disconnected");
                }
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, "Event stream connect failed: {}", err);
                }
            }

            self.set_state(StreamState::Backoff);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.actions.close();
        if !self.actions.is_empty() {
            tracing::debug!("Waiting for the running action to finish");
        }
        self.actions.wait().await;
        self.actions.reopen();

        tracing::info!("Event source adapter stopped");
    }

    /// Read messages until the stream ends; `true` when stopped by cancellation
    async fn pump(&self, stream: &mut dyn MessageStream, cancel: &CancellationToken) -> bool {
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => return true,
                message = stream.next_text() => message,
            };

            match message {
                Some(Ok(text)) => self.dispatch(&text),
                Some(Err(err)) => {
                    tracing::warn!("Event stream error: {}", err);
                    return false;
                }
                None => return false,
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let event = match classify_message(text) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("Discarding stream message: {}", err);
                return;
            }
        };

        let action = self.handler.on_event(&event);
        if action == Action::Ignore {
            return;
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!(?event, "Pipeline busy, dropping event");
            return;
        }

        let guard = InFlightGuard(self.in_flight.clone());
        let handler = self.handler.clone();
        self.actions.spawn(async move {
            let _guard = guard;
            handler.execute(action).await;
        });
    }

    fn set_state(&self, state: StreamState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Stream state changed");
        }
    }
}

/// Clears the in-flight flag when the action finishes, even by panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
