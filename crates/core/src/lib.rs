//! Finishline core data models.
//!
//! This crate defines the data structures shared by the completion-date
//! forecasting engine and its callers: raw requests, validated progress
//! series, forecast results and the error taxonomy.

#![warn(missing_docs)]

// Identities
mod id;

// Input
mod request;
mod series;

// Output
mod result;

// Errors
mod error;

// Re-exports
pub use id::ForecastId;

pub use request::ForecastRequest;
pub use series::{ProgressObservation, ProgressSeries};
pub use result::{Confidence, ForecastResult, ForecastWarning, Outcome, StatusClass};
pub use error::{ExtrapolationError, FitError, MalformedData, ModelError, ValidationError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
