//! Bridge runtime
//!
//! Wires the event source adapter and the liveness monitor around one
//! [`BridgeContext`] and runs both under a single cancellation token. When
//! the token fires both loops stop, then the publisher says goodbye.

use crate::config::BridgeConfig;
use crate::engine::BridgeContext;
use crate::error::{Result, ResultExt};
use crate::publish::{MqttPublisher, Publisher};
use crate::session::SharedSession;
use crate::types::StreamState;
use crate::upstream::{
    EventSourceAdapter, HttpUpstream, LivenessMonitor, StateFetcher, StreamConnector,
    UpstreamApi, WsConnector,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// A fully wired bridge, ready to run
pub struct Bridge {
    context: Arc<BridgeContext>,
    adapter: EventSourceAdapter,
    monitor: LivenessMonitor,
}

impl Bridge {
    /// Wire a bridge over the given transports
    pub fn new(
        config: &BridgeConfig,
        api: Arc<dyn UpstreamApi>,
        connector: Arc<dyn StreamConnector>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let fetcher = StateFetcher::from_config(api.clone(), &config.upstream);
        let context = Arc::new(BridgeContext::new(
            fetcher,
            publisher,
            SharedSession::new(),
            config.telemetry.clone(),
        ));

        let adapter = EventSourceAdapter::new(
            connector,
            context.clone(),
            config.upstream.reconnect_delay(),
        );
        let monitor = LivenessMonitor::new(api, context.clone(), &config.liveness);

        Self {
            context,
            adapter,
            monitor,
        }
    }

    /// Wire a bridge to the configured board manager and MQTT broker
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: &BridgeConfig) -> Result<Self> {
        let api = HttpUpstream::new(&config.upstream).context("Failed to create upstream client")?;
        let connector = WsConnector::new(config.upstream.events_url());
        let publisher = MqttPublisher::start(&config.mqtt);

        tracing::info!(
            upstream = %config.upstream.base_url,
            events = %config.upstream.events_url(),
            broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
            "Bridge wired"
        );

        Ok(Self::new(
            config,
            Arc::new(api),
            Arc::new(connector),
            Arc::new(publisher),
        ))
    }

    /// Shared context of this bridge
    pub fn context(&self) -> Arc<BridgeContext> {
        self.context.clone()
    }

    /// Subscribe to event stream state changes
    pub fn stream_state(&self) -> watch::Receiver<StreamState> {
        self.adapter.state()
    }

    /// Run both loops until `cancel` fires, then shut the publisher down
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Self {
            context,
            adapter,
            monitor,
        } = self;

        let stream_task = tokio::spawn({
            let cancel = cancel.clone();
            async move { adapter.run(cancel).await }
        });
        let liveness_task = tokio::spawn(monitor.run(cancel.clone()));

        cancel.cancelled().await;
        tracing::info!("Shutting down bridge");

        for (name, task) in [("event stream", stream_task), ("liveness", liveness_task)] {
            if let Err(e) = task.await {
                tracing::error!(task = name, "Task ended abnormally: {}", e);
            }
        }

        context.shutdown().await.context("Failed to shut down publisher")
    }
}

/// Complete when the process receives a termination signal
///
/// Handles SIGINT, SIGTERM and SIGQUIT on Unix, Ctrl-C elsewhere.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Complete when the process receives a termination signal
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
