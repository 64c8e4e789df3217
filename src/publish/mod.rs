//! Telemetry publishing
//!
//! [`Publisher`] is the outbound seam of the bridge. The MQTT implementation
//! lives in [`mqtt`]; [`ChannelPublisher`] forwards everything over a
//! crossbeam channel, which is what the tests use and what an embedding
//! application can consume instead of a broker.
//!
//! # Message Kinds
//!
//! - Telemetry: rendered [`TelemetryRecord`](crate::types::TelemetryRecord)
//!   JSON, not retained
//! - Status: `"online"`/`"offline"`, always retained

pub mod mqtt;

pub use mqtt::MqttPublisher;

use crate::error::{BridgeError, Result};
use crate::types::LinkStatus;
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::Value;

/// Outbound side of the bridge
///
/// Publishing never blocks; implementations queue the message and return.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a rendered telemetry record
    fn publish_telemetry(&self, payload: &Value) -> Result<()>;

    /// Publish the upstream link status
    fn publish_status(&self, status: LinkStatus) -> Result<()>;

    /// Announce shutdown and release the transport
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// A message handed to a [`ChannelPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Telemetry(Value),
    Status(LinkStatus),
    Shutdown,
}

/// [`Publisher`] forwarding every message to a crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: Sender<Published>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new() -> (Self, Receiver<Published>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, message: Published) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| BridgeError::Channel("publish receiver dropped".to_string()))
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    fn publish_telemetry(&self, payload: &Value) -> Result<()> {
        self.send(Published::Telemetry(payload.clone()))
    }

    fn publish_status(&self, status: LinkStatus) -> Result<()> {
        self.send(Published::Status(status))
    }

    async fn shutdown(&self) -> Result<()> {
        self.send(Published::Status(LinkStatus::Offline))?;
        self.send(Published::Shutdown)
    }
}
