//! Bridge context and telemetry assembly
//!
//! [`BridgeContext`] is the one place that knows about every collaborator:
//! the state fetcher, the shared session, the publisher and the telemetry
//! schema. The event stream reaches it through [`EventHandler`], the
//! liveness monitor through [`LinkObserver`].
//!
//! # Pipeline
//!
//! ```text
//! motion_state -> fetch state -> translate -> session -> checkout -> publish
//! ```
//!
//! Any step failing skips the event; the next motion event starts over.

use crate::config::TelemetrySchema;
use crate::error::{Result, ResultExt};
use crate::publish::Publisher;
use crate::scoring::{classify, translate};
use crate::session::SharedSession;
use crate::types::{GameState, LegResult, LinkStatus, TelemetryRecord};
use crate::upstream::{Action, EventHandler, LinkObserver, StateFetcher, StreamEvent};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Shared state and collaborators of a running bridge
#[derive(Clone)]
pub struct BridgeContext {
    fetcher: StateFetcher,
    publisher: Arc<dyn Publisher>,
    session: SharedSession,
    schema: TelemetrySchema,
}

impl BridgeContext {
    pub fn new(
        fetcher: StateFetcher,
        publisher: Arc<dyn Publisher>,
        session: SharedSession,
        schema: TelemetrySchema,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            session,
            schema,
        }
    }

    /// The session this context updates
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Build the telemetry record for a fetched state
    ///
    /// Updates the session as a side effect.
    pub fn build_record(&self, state: &Value) -> Result<TelemetryRecord> {
        let game = GameState::from_value(state)?;
        let visit = translate(&game.throws);
        let progress = self
            .session
            .observe(&game.throws, game.player.remaining, game.player.has_won);
        let checkout = classify(
            game.player.remaining,
            game.player.has_won,
            visit.throw_count,
        );

        let summary = visit.summary();
        let [dart1, dart2, dart3] = visit.labels;
        let [dart1_value, dart2_value, dart3_value] = visit.values;

        Ok(TelemetryRecord {
            dart1,
            dart2,
            dart3,
            dart1_value,
            dart2_value,
            dart3_value,
            summary,
            total: visit.total,
            is_180: visit.is_maximum,
            remaining: game.player.remaining,
            checkout_possible: checkout.checkout_possible,
            leg_result: if game.player.has_won {
                LegResult::Win
            } else {
                LegResult::Playing
            },
            board_status: checkout.board_status,
            number_of_throws: visit.throw_count,
            three_dart_average: progress.three_dart_average,
            leg_average: progress.leg_average,
        })
    }

    /// Render and publish a record
    pub fn publish_record(&self, record: &TelemetryRecord) -> Result<()> {
        let payload = self.schema.render(record)?;
        self.publisher.publish_telemetry(&payload)
    }

    /// Fetch the current state and publish its record
    ///
    /// Returns the published record, or `None` when the event was skipped.
    pub async fn handle_throw_event(&self) -> Option<TelemetryRecord> {
        let state = self.fetcher.fetch().await?;

        let record = match self
            .build_record(&state)
            .context("Skipping unusable game state")
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("{}", e);
                return None;
            }
        };

        if let Err(e) = self.publish_record(&record) {
            tracing::warn!("Failed to publish telemetry: {}", e);
            return None;
        }

        tracing::debug!(
            summary = %record.summary,
            total = record.total,
            remaining = record.remaining,
            board_status = ?record.board_status,
            "Published telemetry"
        );
        Some(record)
    }

    /// Publish the upstream link status
    pub fn publish_status(&self, status: LinkStatus) {
        if let Err(e) = self.publisher.publish_status(status) {
            tracing::warn!(%status, "Failed to publish status: {}", e);
        }
    }

    /// Reset the session and publish the offline snapshot
    pub fn handle_offline_edge(&self) {
        self.session.reset();
        if let Err(e) = self.publish_record(&TelemetryRecord::offline()) {
            tracing::warn!("Failed to publish offline snapshot: {}", e);
        }
    }

    /// Announce shutdown through the publisher
    pub async fn shutdown(&self) -> Result<()> {
        self.publisher.shutdown().await
    }
}

#[async_trait]
impl EventHandler for BridgeContext {
    fn on_event(&self, event: &StreamEvent) -> Action {
        match event {
            StreamEvent::MotionState => Action::FetchAndPublish,
            StreamEvent::Other(kind) => {
                tracing::trace!(kind = %kind, "Ignoring stream message");
                Action::Ignore
            }
        }
    }

    async fn execute(&self, action: Action) {
        match action {
            Action::FetchAndPublish => {
                self.handle_throw_event().await;
            }
            Action::Ignore => {}
        }
    }
}

impl LinkObserver for BridgeContext {
    fn on_status(&self, status: LinkStatus) {
        self.publish_status(status);
    }

    fn on_offline_edge(&self) {
        tracing::info!("Upstream lost, resetting session");
        self.handle_offline_edge();
    }
}
