//! Completion model abstraction.
//!
//! Both the trend fitter and the linear fallback answer the same
//! question: given a validated series, when does progress reach the
//! completion threshold? Failure is a value, not a panic.

use finishline_core::{ModelError, ProgressSeries, Time};

/// What a model concluded about completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionEstimate {
    /// Projected to complete at this instant
    Reached(Time),
    /// Model fitted, but completion lies beyond its horizon
    NotWithinHorizon,
}

/// A strategy for estimating the completion date of a series.
pub trait CompletionModel: Send + Sync {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Estimate completion for a validated series.
    fn estimate(&self, series: &ProgressSeries) -> Result<CompletionEstimate, ModelError>;
}
