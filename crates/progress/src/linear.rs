//! Linear extrapolation fallback.

use chrono::Duration;
use finishline_core::{ExtrapolationError, ModelError, ProgressSeries, Time};
use tracing::debug;

use crate::model::{CompletionEstimate, CompletionModel};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Constant-rate projection from the first and last observation.
#[derive(Debug, Clone)]
pub struct LinearExtrapolator {
    capacity: f64,
}

impl LinearExtrapolator {
    /// Create an extrapolator targeting `capacity` percent.
    pub fn new(capacity: f64) -> Self {
        Self { capacity }
    }

    /// Extrapolate the completion date.
    pub fn extrapolate(&self, series: &ProgressSeries) -> Result<Time, ExtrapolationError> {
        let sorted = series.sorted_by_time();
        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ExtrapolationError::DegenerateTimeRange { elapsed_days: 0.0 }),
        };

        let elapsed_days =
            (last.timestamp - first.timestamp).num_milliseconds() as f64 / MS_PER_DAY;
        if elapsed_days <= 0.0 {
            return Err(ExtrapolationError::DegenerateTimeRange { elapsed_days });
        }

        let rate = (last.progress - first.progress) / elapsed_days;
        if rate <= 0.0 {
            return Err(ExtrapolationError::NoProgress { rate });
        }

        let days = (self.capacity - last.progress) / rate;
        let millis = (days * MS_PER_DAY).round();
        let offset = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
            Duration::try_milliseconds(millis as i64)
        } else {
            None
        };
        let date = offset
            .and_then(|offset| last.timestamp.checked_add_signed(offset))
            .ok_or(ExtrapolationError::DateOutOfRange { days })?;

        debug!(rate, days, %date, "Linear extrapolation");
        Ok(date)
    }
}

impl Default for LinearExtrapolator {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl CompletionModel for LinearExtrapolator {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn estimate(&self, series: &ProgressSeries) -> Result<CompletionEstimate, ModelError> {
        Ok(CompletionEstimate::Reached(self.extrapolate(series)?))
    }
}
