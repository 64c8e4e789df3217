//! Telemetry schema settings
//!
//! The published field set is a configuration option rather than a code
//! fork: deployments that only want labels and totals can drop the per-dart
//! numeric values.
//!
//! # Main Types
//!
//! - [`TelemetrySchema`] - Which optional fields are published

use crate::types::TelemetryRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-dart numeric fields that [`TelemetrySchema::include_dart_values`] controls
pub const DART_VALUE_FIELDS: [&str; 3] = ["dart1_value", "dart2_value", "dart3_value"];

/// Field set of the published telemetry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySchema {
    /// Publish `dart1_value`..`dart3_value`
    pub include_dart_values: bool,
}

impl Default for TelemetrySchema {
    fn default() -> Self {
        Self {
            include_dart_values: true,
        }
    }
}

impl TelemetrySchema {
    /// Render a record as the JSON payload for this schema
    pub fn render(&self, record: &TelemetryRecord) -> serde_json::Result<Value> {
        let mut payload = serde_json::to_value(record)?;
        if !self.include_dart_values {
            if let Value::Object(fields) = &mut payload {
                for field in DART_VALUE_FIELDS {
                    fields.remove(field);
                }
            }
        }
        Ok(payload)
    }
}
