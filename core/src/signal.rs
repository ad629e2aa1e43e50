//! Raw observations as read back from the signal store.

use serde::{Deserialize, Serialize};

/// A single observation from one collector table.
///
/// `value` is `None` when the stored cell was empty or could not be
/// parsed as a number. Readers decide what that means for their metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub source_table: String,
    pub metric_key:   String,
    pub entity_key:   String,
    pub timestamp:    String,
    pub value:        Option<f64>,
}

impl SignalRecord {
    pub fn new(
        source_table: &str,
        metric_key:   &str,
        entity_key:   &str,
        timestamp:    &str,
        value:        Option<f64>,
    ) -> Self {
        Self {
            source_table: source_table.to_string(),
            metric_key:   metric_key.to_string(),
            entity_key:   entity_key.to_string(),
            timestamp:    timestamp.to_string(),
            value,
        }
    }
}

/// Parsed values of a record series, in stored order, skipping unparseable cells.
pub fn values(records: &[SignalRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.value).collect()
}
