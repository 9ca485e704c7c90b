//! Plausibility checks on produced dates.

use chrono::Duration;
use finishline_core::{Confidence, ProgressSeries, Time};

/// Bounds how far ahead a prediction may be trusted.
#[derive(Debug, Clone)]
pub struct PlausibilityGuard {
    capacity: f64,
    far_future_days: u32,
}

impl PlausibilityGuard {
    /// Create a guard.
    pub fn new(capacity: f64, far_future_days: u32) -> Self {
        Self {
            capacity,
            far_future_days,
        }
    }

    /// Classify a predicted date relative to `now`.
    ///
    /// Dates strictly after `now + far_future_days` are far-future.
    pub fn classify(&self, predicted: Time, now: Time) -> Confidence {
        match now.checked_add_signed(Duration::days(i64::from(self.far_future_days))) {
            Some(limit) if predicted <= limit => Confidence::Confident,
            Some(_) => Confidence::FarFuture,
            // Window runs past the end of time: nothing can exceed it.
            None => Confidence::Confident,
        }
    }

    /// Completion instant of an already-complete series.
    ///
    /// Returns the latest timestamp when any observation reached the
    /// capacity.
    pub fn already_complete(&self, series: &ProgressSeries) -> Option<Time> {
        match series.max_progress() {
            Some(max) if max >= self.capacity => series.latest_timestamp(),
            _ => None,
        }
    }
}

impl Default for PlausibilityGuard {
    fn default() -> Self {
        Self::new(100.0, 730)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finishline_core::ProgressObservation;

    fn now() -> Time {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_classify_boundary() {
        let guard = PlausibilityGuard::default();
        assert_eq!(guard.classify(now() + Duration::days(10), now()), Confidence::Confident);
        assert_eq!(guard.classify(now() + Duration::days(730), now()), Confidence::Confident);
        assert_eq!(
            guard.classify(now() + Duration::days(730) + Duration::seconds(1), now()),
            Confidence::FarFuture
        );
        // Past dates are not suspicious
        assert_eq!(guard.classify(now() - Duration::days(400), now()), Confidence::Confident);
    }

    #[test]
    fn test_already_complete_uses_latest_timestamp() {
        let t = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let series = ProgressSeries::new(vec![
            ProgressObservation::new(t(5), 100.0),
            ProgressObservation::new(t(9), 95.0),
            ProgressObservation::new(t(1), 20.0),
        ]);
        assert_eq!(PlausibilityGuard::default().already_complete(&series), Some(t(9)));

        let incomplete = ProgressSeries::new(vec![
            ProgressObservation::new(t(1), 20.0),
            ProgressObservation::new(t(2), 99.9),
        ]);
        assert_eq!(PlausibilityGuard::default().already_complete(&incomplete), None);
    }
}
