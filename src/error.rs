//! Error types for the harvest-forecast library.

use crate::core::Timeslot;
use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading traces, selecting references or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// An analyzer needed at least one reference series in its pool.
    #[error("analyzer pool is empty")]
    EmptyPool,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A sample was appended before the last stored timeslot.
    #[error("timeslot {got} precedes the last stored timeslot {previous}")]
    TimeslotOrder { previous: Timeslot, got: Timeslot },

    /// The series carries no collection date but the operation needs one.
    #[error("series has no collection date")]
    MissingDate,

    /// Two paired inputs have different lengths.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A trace line could not be parsed as a number.
    #[error("invalid trace value on line {line}: {content:?}")]
    Parse { line: usize, content: String },

    /// Reading a trace file or directory failed.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    Computation(String),
}

impl ForecastError {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
