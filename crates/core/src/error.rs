//! Error taxonomy of the forecasting engine.
//!
//! Validation errors short-circuit a forecast. Model errors never reach
//! the caller: a failed trend fit falls back to linear extrapolation,
//! and a failed extrapolation becomes a documented "no prediction"
//! outcome.

use crate::result::Outcome;

/// Why a raw history could not be turned into a series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Request absent or without a history field
    #[error("missing progress history")]
    MissingData,

    /// Fewer observations than required
    #[error("need at least {required} data points, got {found}")]
    InsufficientData {
        /// Observations present
        found: usize,
        /// Observations required
        required: usize,
    },

    /// Some part of the history cannot be parsed
    #[error("malformed progress history: {0}")]
    MalformedData(#[from] MalformedData),
}

impl ValidationError {
    /// Outcome reported to the caller.
    pub fn outcome(&self) -> Outcome {
        match self {
            ValidationError::MissingData => Outcome::MissingHistory,
            ValidationError::InsufficientData { .. } => Outcome::InsufficientData,
            ValidationError::MalformedData(MalformedData::InvalidFormat(_)) => {
                Outcome::InvalidFormat
            }
            ValidationError::MalformedData(MalformedData::InvalidValue { .. }) => {
                Outcome::InvalidValues
            }
        }
    }
}

/// Detail of a malformed history. One bad row invalidates the batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedData {
    /// History is not a list of records
    #[error("invalid data format: {0}")]
    InvalidFormat(String),

    /// A row holds a missing or unparseable value
    #[error("row {index}: invalid {field}: {reason}")]
    InvalidValue {
        /// Zero-based row index
        index: usize,
        /// Offending field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// The trend model could not be fitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Not enough distinct time points to fit the curve
    #[error("too few distinct time points: {found} (need {required})")]
    TooFewDistinctPoints {
        /// Distinct timestamps present
        found: usize,
        /// Distinct timestamps required
        required: usize,
    },

    /// Progress or time carries no variance
    #[error("degenerate variance in {0}")]
    DegenerateVariance(&'static str),

    /// Optimiser hit its iteration cap
    #[error("fit did not converge after {iterations} iterations")]
    NotConverged {
        /// Iterations performed
        iterations: usize,
    },

    /// Non-finite values appeared during fitting
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Projection horizon falls outside the representable date range
    #[error("projection horizon out of range")]
    HorizonOutOfRange,

    /// Trend fitting switched off by configuration
    #[error("trend fitting disabled")]
    Disabled,
}

/// Linear extrapolation could not produce a date.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtrapolationError {
    /// First and last observation are not strictly ordered in time
    #[error("invalid date range: {elapsed_days} days elapsed")]
    DegenerateTimeRange {
        /// Elapsed days between first and last observation
        elapsed_days: f64,
    },

    /// Flat or declining trend
    #[error("no progress being made (rate {rate} per day)")]
    NoProgress {
        /// Average daily progress rate
        rate: f64,
    },

    /// Completion lies outside the representable date range
    #[error("completion date out of range ({days} days ahead)")]
    DateOutOfRange {
        /// Days to completion
        days: f64,
    },
}

/// Failure of a completion model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Trend fit failure
    #[error("model fit failed: {0}")]
    Fit(#[from] FitError),

    /// Extrapolation failure
    #[error("extrapolation failed: {0}")]
    Extrapolation(#[from] ExtrapolationError),
}
