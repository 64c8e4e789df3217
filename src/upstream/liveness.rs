//! Upstream liveness monitor
//!
//! Polls the board manager on a fixed interval, independent of the event
//! stream. The current [`LinkStatus`] is reported on every poll so retained
//! status messages stay fresh; the Online→Offline transition is reported
//! once, and that is where the session gets reset.

use crate::config::LivenessConfig;
use crate::types::LinkStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::client::UpstreamApi;

/// Receives liveness results
pub trait LinkObserver: Send + Sync {
    /// Called after every poll
    fn on_status(&self, status: LinkStatus);

    /// Called once per Online→Offline transition
    fn on_offline_edge(&self);
}

/// Result of folding one probe into the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessUpdate {
    pub status: LinkStatus,
    /// The link was online at the previous poll and is offline now
    pub went_offline: bool,
}

/// Debounces probe results into transitions
#[derive(Debug, Clone, Default)]
pub struct LivenessTracker {
    state: Option<LinkStatus>,
    last_checked_at: Option<DateTime<Utc>>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last observed status; `None` before the first poll
    pub fn state(&self) -> Option<LinkStatus> {
        self.state
    }

    /// When the last probe completed
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    /// Record a probe result
    ///
    /// Starting out offline is not a transition; only losing a link that was
    /// seen online is.
    pub fn observe(&mut self, status: LinkStatus, now: DateTime<Utc>) -> LivenessUpdate {
        let previous = self.state.replace(status);
        self.last_checked_at = Some(now);

        if previous != Some(status) {
            match status {
                LinkStatus::Online => tracing::info!("Board manager is online"),
                LinkStatus::Offline => tracing::warn!("Board manager is offline"),
            }
        }

        LivenessUpdate {
            status,
            went_offline: previous == Some(LinkStatus::Online) && status == LinkStatus::Offline,
        }
    }
}

/// Periodic probe of the board manager
pub struct LivenessMonitor {
    api: Arc<dyn UpstreamApi>,
    observer: Arc<dyn LinkObserver>,
    probe_path: String,
    interval: Duration,
    timeout: Duration,
    tracker: LivenessTracker,
}

impl LivenessMonitor {
    pub fn new(
        api: Arc<dyn UpstreamApi>,
        observer: Arc<dyn LinkObserver>,
        config: &LivenessConfig,
    ) -> Self {
        Self {
            api,
            observer,
            probe_path: config.probe_path.clone(),
            interval: config.interval(),
            timeout: config.timeout(),
            tracker: LivenessTracker::new(),
        }
    }

    /// Debounce state
    pub fn tracker(&self) -> &LivenessTracker {
        &self.tracker
    }

    /// Probe once; online iff the probe path answers 200 in time
    pub async fn probe(&self) -> LinkStatus {
        match self.api.get(&self.probe_path, self.timeout).await {
            Ok(reply) if reply.is_ok() => LinkStatus::Online,
            Ok(reply) => {
                tracing::debug!(status = reply.status, "Liveness probe rejected");
                LinkStatus::Offline
            }
            Err(e) => {
                tracing::debug!("Liveness probe failed: {}", e);
                LinkStatus::Offline
            }
        }
    }

    /// Probe, update the tracker and notify the observer
    pub async fn poll_once(&mut self) -> LivenessUpdate {
        let status = self.probe().await;
        let update = self.tracker.observe(status, Utc::now());

        self.observer.on_status(update.status);
        if update.went_offline {
            self.observer.on_offline_edge();
        }
        update
    }

    /// Poll until `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            path = %self.probe_path,
            interval_secs = self.interval.as_secs(),
            "Liveness monitor started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
        }

        tracing::info!("Liveness monitor stopped");
    }
}
