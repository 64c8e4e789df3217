//! # dartbridge: Autodarts to MQTT telemetry bridge
//!
//! Listens to a dart board manager's event stream, pulls the game state after
//! every throw, turns it into a flat telemetry record and publishes that to an
//! MQTT broker for home automation consumers. Reachability of the board
//! manager is polled independently and reported as a retained status.
//!
//! ## Architecture
//!
//! - **Upstream**: WebSocket event stream, HTTP state fetcher and liveness probe
//! - **Scoring**: Pure dart labelling, visit totals and checkout classification
//! - **Session**: Running leg statistics shared between the two loops
//! - **Publish**: MQTT publisher with a pre-armed last-will, or a crossbeam channel
//! - **Engine**: The bridge context tying the above together
//!
//! ## Configuration
//!
//! The bridge reads a TOML file, by default from the platform-appropriate
//! config directory under `dartbridge`:
//!
//! - **Linux**: `~/.config/dartbridge/config.toml`
//! - **macOS**: `~/Library/Application Support/dartbridge/config.toml`
//! - **Windows**: `%APPDATA%\dartbridge\config.toml`
//!
//! ## Example
//!
//! ```ignore
//! use dartbridge::{bridge::wait_for_shutdown_signal, Bridge, BridgeConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> dartbridge::Result<()> {
//!     let config = BridgeConfig::load("config.toml")?;
//!     let bridge = Bridge::connect(&config)?;
//!
//!     let cancel = CancellationToken::new();
//!     let trigger = cancel.clone();
//!     tokio::spawn(async move {
//!         let _ = wait_for_shutdown_signal().await;
//!         trigger.cancel();
//!     });
//!
//!     bridge.run(cancel).await
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod publish;
pub mod scoring;
pub mod session;
pub mod types;
pub mod upstream;

// Re-export commonly used types
pub use bridge::Bridge;
pub use config::{BridgeConfig, TelemetrySchema};
pub use engine::BridgeContext;
pub use error::{BridgeError, Result};
pub use publish::{ChannelPublisher, MqttPublisher, Published, Publisher};
pub use session::SharedSession;
pub use types::{GameState, LinkStatus, StreamState, TelemetryRecord, Throw, ThrowSet};
