//! Row layout for persisted verification results

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::VerificationResult;

/// Timestamp layout written to the sheet
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One appended row: `[value_1, .., value_n, status, timestamp]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRow {
    pub values: Vec<String>,
    pub status: String,
    pub timestamp: String,
}

impl PersistedRow {
    /// Build a row stamped with `at`, rendered in `zone`
    pub fn new(result: &VerificationResult, at: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            values: result.keys.keys().iter().map(|k| k.to_string()).collect(),
            status: result.status().to_string(),
            timestamp: zone
                .from_utc_datetime(&at.naive_utc())
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        }
    }

    /// Build a row stamped with the current time
    pub fn now(result: &VerificationResult, zone: Tz) -> Self {
        Self::new(result, Utc::now(), zone)
    }

    /// All cells in sheet order
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.values.clone();
        cells.push(self.status.clone());
        cells.push(self.timestamp.clone());
        cells
    }
}
