//! MQTT publisher
//!
//! Built on rumqttc's `AsyncClient`. The client queues outgoing packets; a
//! separate driver task polls the event loop, which is what actually talks to
//! the broker and reconnects after failures.
//!
//! The broker is told at connect time to publish a retained `"offline"` on
//! the status topic should the bridge vanish without saying goodbye.

use crate::config::MqttConfig;
use crate::error::{BridgeError, Result};
use crate::types::LinkStatus;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::Publisher;

/// Capacity of the client's request queue
const REQUEST_CAPACITY: usize = 32;

/// Pause after an event loop error before polling again
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// How long shutdown waits for the goodbye to reach the broker
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Build client options with the last-will armed
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(config.keep_alive());
    options.set_clean_session(true);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username, password);
    }
    options.set_last_will(LastWill::new(
        &config.status_topic,
        LinkStatus::Offline.as_str(),
        QoS::AtLeastOnce,
        true,
    ));
    options
}

/// [`Publisher`] backed by an MQTT broker
pub struct MqttPublisher {
    client: AsyncClient,
    state_topic: String,
    status_topic: String,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttPublisher {
    /// Create the client and spawn its event loop driver
    ///
    /// Must be called from within a tokio runtime. Connecting happens in the
    /// background; messages published before the broker answers are queued.
    pub fn start(config: &MqttConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
        let broker = format!("{}:{}", config.host, config.port);
        let driver = tokio::spawn(drive(eventloop, broker));

        Self {
            client,
            state_topic: config.state_topic.clone(),
            status_topic: config.status_topic.clone(),
            driver: Mutex::new(Some(driver)),
        }
    }

    fn take_driver(&self) -> Option<JoinHandle<()>> {
        self.driver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    fn publish_telemetry(&self, payload: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(payload)?;
        self.client
            .try_publish(&self.state_topic, QoS::AtMostOnce, false, bytes)?;
        Ok(())
    }

    fn publish_status(&self, status: LinkStatus) -> Result<()> {
        self.client
            .try_publish(&self.status_topic, QoS::AtLeastOnce, true, status.as_str())?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let mut driver = self.take_driver();

        // A full request queue never drains while the broker is unreachable
        let goodbye = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            self.client
                .publish(
                    &self.status_topic,
                    QoS::AtLeastOnce,
                    true,
                    LinkStatus::Offline.as_str(),
                )
                .await?;
            self.client.disconnect().await?;
            if let Some(driver) = driver.as_mut() {
                if let Err(e) = driver.await {
                    tracing::debug!("MQTT driver ended abnormally: {}", e);
                }
            }
            Ok::<(), BridgeError>(())
        })
        .await;

        if let Some(driver) = driver {
            driver.abort();
        }
        match goodbye {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("MQTT goodbye did not complete in time");
                Ok(())
            }
        }
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        if let Some(driver) = self.take_driver() {
            driver.abort();
        }
    }
}

/// Poll the event loop until the client disconnects
async fn drive(mut eventloop: EventLoop, broker: String) {
    let mut connected = false;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                connected = true;
                tracing::info!(broker = %broker, code = ?ack.code, "Connected to MQTT broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!(broker = %broker, "Disconnected from MQTT broker");
                break;
            }
            Ok(event) => tracing::trace!(?event, "MQTT event"),
            Err(err) => {
                if connected {
                    tracing::warn!(broker = %broker, "MQTT connection lost: {}", err);
                } else {
                    tracing::warn!(broker = %broker, "MQTT connect failed: {}", err);
                }
                connected = false;
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
