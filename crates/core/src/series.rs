//! Validated progress history.

use serde::{Deserialize, Serialize};
use crate::Time;

/// A single (timestamp, progress) observation.
///
/// `progress` is a percentage and is expected to lie in [0, 100], but it
/// is never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressObservation {
    /// When the observation was taken
    pub timestamp: Time,

    /// Reported completion percentage
    pub progress: f64,
}

impl ProgressObservation {
    /// Create a new observation.
    pub fn new(timestamp: Time, progress: f64) -> Self {
        Self { timestamp, progress }
    }
}

/// An ordered-by-insertion sequence of observations.
///
/// Observations are not guaranteed to be sorted by timestamp; use
/// [`ProgressSeries::sorted_by_time`] when chronological order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSeries {
    observations: Vec<ProgressObservation>,
}

impl ProgressSeries {
    /// Wrap already-parsed observations.
    pub fn new(observations: Vec<ProgressObservation>) -> Self {
        Self { observations }
    }

    /// Observations in insertion order.
    pub fn observations(&self) -> &[ProgressObservation] {
        &self.observations
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations sorted by timestamp. Ties keep insertion order.
    pub fn sorted_by_time(&self) -> Vec<ProgressObservation> {
        let mut sorted = self.observations.clone();
        sorted.sort_by_key(|o| o.timestamp);
        sorted
    }

    /// Highest progress value observed.
    pub fn max_progress(&self) -> Option<f64> {
        self.observations
            .iter()
            .map(|o| o.progress)
            .fold(None, |acc, p| match acc {
                Some(max) if max >= p => Some(max),
                _ => Some(p),
            })
    }

    /// Latest timestamp in the series.
    pub fn latest_timestamp(&self) -> Option<Time> {
        self.observations.iter().map(|o| o.timestamp).max()
    }

    /// Whether progress never decreases once sorted by timestamp.
    pub fn is_non_decreasing(&self) -> bool {
        self.sorted_by_time()
            .windows(2)
            .all(|pair| pair[1].progress >= pair[0].progress)
    }

    /// Number of distinct timestamps.
    pub fn distinct_timestamps(&self) -> usize {
        let sorted = self.sorted_by_time();
        let mut count = 0;
        let mut last = None;
        for obs in &sorted {
            if last != Some(obs.timestamp) {
                count += 1;
                last = Some(obs.timestamp);
            }
        }
        count
    }
}
