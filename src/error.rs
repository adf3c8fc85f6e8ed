//! Error types for motion log analysis and acquisition.

use crate::domain::models::DeviceId;
use thiserror::Error;

/// Errors raised by the offline analysis core
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A log line is not valid JSON or lacks a usable field
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Numeric configuration outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A series with no samples reached a stage that needs data
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Every event in a batch has zero magnitude, so no percentage scale exists
    #[error("All event magnitudes are zero")]
    ZeroMagnitude,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// True when the caller should skip the device rather than report a failure
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput(_))
    }
}

/// Errors raised while polling motion sources
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The controller stopped answering polls
    #[error("{0} Joy-Con is unavailable")]
    DeviceUnavailable(DeviceId),

    #[error("Failed to write motion log: {0}")]
    Log(#[from] std::io::Error),
}

/// Convenience alias for analysis results
pub type Result<T> = std::result::Result<T, AnalysisError>;
