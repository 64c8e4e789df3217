//! Scoring rules
//!
//! Pure functions over a single fetched state:
//!
//! - [`translator`] - dart labels, values, visit total and the 180 flag
//! - [`checkout`] - checkout legality and board status

pub mod checkout;
pub mod translator;

pub use checkout::{classify, is_checkout_possible, CheckoutStatus, BOGEY_SCORES, MAX_CHECKOUT};
pub use translator::{dart_label, translate, VisitSummary};

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
