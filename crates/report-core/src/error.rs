//! Error types for report-core

use thiserror::Error;

/// Result type alias for report-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core model operations
#[derive(Error, Debug)]
pub enum Error {
    /// Entity identifier failed validation
    #[error("Invalid entity identifier '{input}': {reason}")]
    InvalidEntity { input: String, reason: String },

    /// Unknown report kind tag
    #[error("Unknown report kind: {0}")]
    UnknownReportKind(String),

    /// Unknown dataset kind tag
    #[error("Unknown dataset kind: {0}")]
    UnknownDatasetKind(String),

    /// Dataset payload could not be decoded
    #[error("Failed to decode {kind} payload: {detail}")]
    PayloadDecode { kind: String, detail: String },
}
