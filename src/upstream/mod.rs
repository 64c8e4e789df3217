//! Upstream board manager integration
//!
//! Everything that talks to the board manager lives here:
//!
//! - [`client`] - HTTP query seam ([`UpstreamApi`]) and its reqwest implementation
//! - [`fetcher`] - Settle-then-fetch of the current game state with fallback paths
//! - [`events`] - WebSocket event stream supervisor and dispatch interface
//! - [`liveness`] - Independent reachability polling with edge detection
//!
//! With the `mock-upstream` feature, [`mock`] provides scripted stand-ins for
//! the HTTP client and the event stream.

pub mod client;
pub mod events;
pub mod fetcher;
pub mod liveness;

#[cfg(any(test, feature = "mock-upstream"))]
pub mod mock;

pub use client::{HttpReply, HttpUpstream, UpstreamApi};
pub use events::{
    classify_message, Action, EventHandler, EventSourceAdapter, MessageStream, StreamConnector,
    StreamEvent, WsConnector,
};
pub use fetcher::StateFetcher;
pub use liveness::{LinkObserver, LivenessMonitor, LivenessTracker, LivenessUpdate};
