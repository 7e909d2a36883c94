//! Error types for the data-loader crate.
//!
//! Only snapshot loading can fail. Once a catalog or interaction snapshot is
//! in memory the ranking crates treat it as validated input.

use thiserror::Error;

/// Errors that can occur while loading and validating snapshots
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot file is not valid JSON for the expected shape
    #[error("Malformed snapshot {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
