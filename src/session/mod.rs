//! Session tracking module
//!
//! This module owns the running statistics of the leg in progress. The
//! aggregator is written from two places: the throw pipeline (every fetched
//! state) and the liveness monitor (reset on an offline edge). Both go
//! through [`SharedSession`], which guards the counters with one mutex so a
//! reset can never interleave with a visit update.
//!
//! # Features
//!
//! - Running scored points and darts since the last leg win
//! - Per-visit and per-leg three-dart averages
//! - Deduplication of darts re-reported within the same visit
//! - Reset on leg win and on upstream loss

pub mod aggregator;
pub mod types;

pub use aggregator::SessionAggregator;
pub use types::SessionProgress;

use crate::types::ThrowSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session aggregator shared between the stream and liveness loops
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionAggregator>>,
}

impl SharedSession {
    /// Create an empty shared session
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fetched state into the session
    pub fn observe(&self, throws: &ThrowSet, remaining: u32, has_won: bool) -> SessionProgress {
        self.lock().observe(throws, remaining, has_won)
    }

    /// Forget the leg and the visit in progress
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Current (points, darts) pair
    pub fn totals(&self) -> (u32, u32) {
        let session = self.lock();
        (session.total_scored_points(), session.total_darts_thrown())
    }

    /// Current leg average
    pub fn leg_average(&self) -> f64 {
        self.lock().leg_average()
    }

    // Updates are plain assignments; a poisoned lock still holds a consistent pair.
    fn lock(&self) -> MutexGuard<'_, SessionAggregator> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
