//! Session data types

/// Averages derived from one fetched state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionProgress {
    /// Visit total normalized to three darts
    pub three_dart_average: f64,
    /// Three-dart average over the leg, before any win reset
    pub leg_average: f64,
    /// This state completed the leg (win transition)
    pub leg_completed: bool,
}
