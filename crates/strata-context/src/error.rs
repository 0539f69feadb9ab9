//! Error types for context assembly.

use strata_core::StrataError;

use crate::budget::CompressionLevel;
use crate::measure::MeasureError;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The size measure failed; the scan cannot trust any budget decision.
    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error("Deadline exceeded before compression level {level}")]
    DeadlineExceeded { level: CompressionLevel },

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error(transparent)]
    Core(#[from] StrataError),
}

pub type ContextResult<T> = Result<T, ContextError>;
