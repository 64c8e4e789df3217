//! Checkout classification
//!
//! Decides whether the remaining score can be finished with darts and what
//! the board is currently waiting for. Recomputed from scratch on every
//! fetched state; nothing here is persisted between events.

use crate::types::BoardStatus;

/// Highest score that can be checked out in one visit
pub const MAX_CHECKOUT: u32 = 170;

/// Scores at or below [`MAX_CHECKOUT`] that have no finishing combination
pub const BOGEY_SCORES: [u32; 7] = [159, 162, 163, 165, 166, 168, 169];

/// Result of classifying one fetched state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutStatus {
    /// Whether `remaining` can be finished
    pub checkout_possible: bool,
    /// What the board is waiting for
    pub board_status: BoardStatus,
}

/// Whether a remaining score can be finished under double-out rules
pub fn is_checkout_possible(remaining: u32) -> bool {
    remaining > 1 && remaining <= MAX_CHECKOUT && !BOGEY_SCORES.contains(&remaining)
}

/// Classify the board for the current player
///
/// A leg win takes precedence over everything; otherwise a live checkout
/// with darts already in the board means a takeout is in progress.
pub fn classify(remaining: u32, leg_won: bool, darts_this_visit: usize) -> CheckoutStatus {
    let checkout_possible = is_checkout_possible(remaining);
    let board_status = if leg_won {
        BoardStatus::Takeout
    } else if checkout_possible && darts_this_visit > 0 {
        BoardStatus::TakeoutInProgress
    } else {
        BoardStatus::Throw
    };

    CheckoutStatus {
        checkout_possible,
        board_status,
    }
}
