//! Result sinks
//!
//! This module consolidates:
//! - Terminal rendering (console.rs)
//! - Persisted row layout (record.rs)
//! - Record stores: local CSV (csv.rs) and Google Sheets (google.rs)

pub mod console;
pub mod csv;
pub mod google;
pub mod record;

pub use console::ConsoleSink;
pub use csv::CsvSheet;
pub use google::{GoogleSheet, GoogleSheetConfig, ServiceAccountEnv};
pub use record::PersistedRow;

use crate::domain::VerificationResult;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{0} is not set; results were not saved")]
    ConfigurationMissing(&'static str),

    #[error("service account credentials are unusable: {0}")]
    Credentials(String),

    #[error("could not write result file: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet request failed: {0}")]
    Http(String),

    #[error("spreadsheet rejected the row (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Displays a verification outcome to the operator
pub trait ResultSink {
    fn render(&mut self, result: &VerificationResult);
}

/// Append-only storage for completed sessions
pub trait RecordStore {
    fn append(&mut self, row: &PersistedRow) -> Result<(), PersistError>;
}
