//! Session aggregator for running leg statistics

use crate::scoring::round2;
use crate::types::{Throw, ThrowSet, DARTS_PER_VISIT};

use super::types::SessionProgress;

/// Running scored points and darts since the last leg completion
///
/// The board re-reports the whole visit after every dart, so the aggregator
/// remembers which darts of the visit in progress it has already counted.
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    /// Points scored this leg
    total_scored_points: u32,
    /// Darts thrown this leg
    total_darts_thrown: u32,
    /// Darts of the visit in progress that are already counted
    counted_visit: Vec<Throw>,
    /// Remaining score reported alongside `counted_visit`
    counted_remaining: Option<u32>,
    /// Last observed win flag, for edge detection
    leg_won: bool,
}

impl SessionAggregator {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Points scored since the last leg completion
    pub fn total_scored_points(&self) -> u32 {
        self.total_scored_points
    }

    /// Darts thrown since the last leg completion
    pub fn total_darts_thrown(&self) -> u32 {
        self.total_darts_thrown
    }

    /// Add a visit's darts to the running totals
    ///
    /// Ignored when no dart was thrown.
    pub fn record_visit(&mut self, throw_count: usize, throw_total: u32) {
        if throw_count == 0 {
            return;
        }
        self.total_scored_points += throw_total;
        self.total_darts_thrown += throw_count as u32;
    }

    /// Visit average, always normalized to three darts
    pub fn per_visit_average(throw_total: u32, throw_count: usize) -> f64 {
        if throw_count == 0 {
            return 0.0;
        }
        round2(throw_total as f64 / DARTS_PER_VISIT as f64)
    }

    /// Three-dart average over the leg so far
    pub fn leg_average(&self) -> f64 {
        if self.total_darts_thrown == 0 {
            return 0.0;
        }
        round2(self.total_scored_points as f64 / self.total_darts_thrown as f64 * 3.0)
    }

    /// Zero the running totals after a leg win
    pub fn reset_on_win(&mut self) {
        self.total_scored_points = 0;
        self.total_darts_thrown = 0;
    }

    /// Forget everything, including the visit in progress
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one fetched state into the session
    ///
    /// Counts the darts not seen before, computes the averages and, on the
    /// transition into a won leg, zeroes the totals. The returned averages
    /// are taken before that reset so the winning record carries the
    /// finished leg.
    ///
    /// The same darts reported with a different remaining score belong to a
    /// new visit that happens to repeat the previous one.
    pub fn observe(
        &mut self,
        throws: &ThrowSet,
        remaining: u32,
        has_won: bool,
    ) -> SessionProgress {
        let repeated_visit = throws.as_slice() == self.counted_visit.as_slice()
            && self.counted_remaining.is_some_and(|counted| counted != remaining);
        if repeated_visit {
            self.counted_visit.clear();
        }

        let (new_darts, new_points) = self.uncounted(throws.as_slice());
        self.record_visit(new_darts, new_points);
        self.counted_visit = throws.as_slice().to_vec();
        self.counted_remaining = Some(remaining);

        let visit_total: u32 = throws.as_slice().iter().map(Throw::value).sum();
        let progress = SessionProgress {
            three_dart_average: Self::per_visit_average(visit_total, throws.len()),
            leg_average: self.leg_average(),
            leg_completed: has_won && !self.leg_won,
        };

        if progress.leg_completed {
            tracing::info!(leg_average = progress.leg_average, "Leg won, resetting session");
            self.reset_on_win();
        }
        self.leg_won = has_won;

        progress
    }

    /// Darts and points in `throws` that were not counted yet
    fn uncounted(&self, throws: &[Throw]) -> (usize, u32) {
        let counted = &self.counted_visit;
        let extends_counted = throws.len() >= counted.len() && throws.starts_with(counted);
        let fresh = if extends_counted {
            &throws[counted.len()..]
        } else {
            throws
        };
        (fresh.len(), fresh.iter().map(Throw::value).sum())
    }
}
