//! Error types for result building

use thiserror::Error;

/// Invalid combiner, filter or extractor configuration
///
/// Raised by constructors, before any subject is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultsError {
    /// A threshold is not a finite number
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(f64),

    /// A percentage outside 0..=100
    #[error("Percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(f64),

    /// A multiplicative margin below 1
    #[error("Margin must be at least 1.0, got {0}")]
    InvalidMargin(f64),

    /// A component that needs at least one stage was given none
    #[error("{0} needs at least one stage")]
    NoStages(&'static str),
}

pub(crate) fn finite(value: f64) -> Result<f64, ResultsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ResultsError::InvalidThreshold(value))
    }
}
