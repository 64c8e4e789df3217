//! Throw translation
//!
//! Turns the raw darts of a visit into display labels, per-dart values, the
//! visit total and the maximum ("180") flag. Translation is pure and never
//! fails: missing slots are padded with the miss sentinel.

use crate::types::{Throw, ThrowSet, DARTS_PER_VISIT, MISS_LABEL};

/// Labels and values for one visit, padded to three slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitSummary {
    /// Display label per slot (`M`, `D16`, `T20`, `5`, ...)
    pub labels: [String; DARTS_PER_VISIT],
    /// Points per slot
    pub values: [u32; DARTS_PER_VISIT],
    /// Sum of the values
    pub total: u32,
    /// Darts actually thrown
    pub throw_count: usize,
    /// Three treble twenties
    pub is_maximum: bool,
}

impl VisitSummary {
    /// Labels joined for the summary field
    pub fn summary(&self) -> String {
        self.labels.join(" | ")
    }
}

/// Display label for a single dart
pub fn dart_label(throw: &Throw) -> String {
    match throw.multiplier {
        0 => MISS_LABEL.to_string(),
        2 => format!("D{}", throw.segment_number),
        3 => format!("T{}", throw.segment_number),
        _ => throw.segment_number.to_string(),
    }
}

/// Translate the darts of a visit
pub fn translate(throws: &ThrowSet) -> VisitSummary {
    let mut labels: [String; DARTS_PER_VISIT] = Default::default();
    let mut values = [0u32; DARTS_PER_VISIT];

    for slot in 0..DARTS_PER_VISIT {
        match throws.get(slot) {
            Some(throw) => {
                labels[slot] = dart_label(throw);
                values[slot] = throw.value();
            }
            None => labels[slot] = MISS_LABEL.to_string(),
        }
    }

    let is_maximum =
        throws.len() == DARTS_PER_VISIT && throws.as_slice().iter().all(Throw::is_treble_twenty);

    VisitSummary {
        labels,
        values,
        total: values.iter().sum(),
        throw_count: throws.len(),
        is_maximum,
    }
}
