//! Logistic trend fitting.
//!
//! Fits `y(t) = C / (1 + exp(-k (t - m)))` with a fixed capacity `C` to
//! the time-ordered history, projects it day by day past the latest
//! observation, and reports the first projected point at or above the
//! completion threshold.

use chrono::Duration;
use finishline_core::{FitError, ModelError, ProgressSeries, Time};
use tracing::debug;

use crate::config::{FitConfig, ForecastConfig};
use crate::model::{CompletionEstimate, CompletionModel};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Observed progress is clamped this far inside (0, C) before taking logits.
const LOGIT_MARGIN: f64 = 0.005;

const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;

/// Fitted logistic curve parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    /// Growth ceiling
    pub capacity: f64,
    /// Growth rate per day
    pub rate: f64,
    /// Inflection point, in days after `origin`
    pub midpoint: f64,
    /// Time zero of the day axis (earliest observation)
    pub origin: Time,
}

impl LogisticParams {
    /// Curve value `t` days after the origin.
    pub fn value_at_days(&self, t: f64) -> f64 {
        self.capacity / (1.0 + (-self.rate * (t - self.midpoint)).exp())
    }

    /// Curve value at an instant.
    pub fn value_at(&self, timestamp: Time) -> f64 {
        self.value_at_days(days_between(self.origin, timestamp))
    }
}

/// A point of the projected curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Instant
    pub timestamp: Time,
    /// Projected progress
    pub progress: f64,
}

/// Projected progress in chronological order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedCurve {
    points: Vec<ProjectedPoint>,
}

impl ProjectedCurve {
    /// Points in chronological order.
    pub fn points(&self) -> &[ProjectedPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First instant whose projected progress reaches `threshold`.
    pub fn first_reaching(&self, threshold: f64) -> Option<Time> {
        self.points
            .iter()
            .find(|p| p.progress >= threshold)
            .map(|p| p.timestamp)
    }
}

/// Primary completion model: saturating logistic growth.
#[derive(Debug, Clone)]
pub struct LogisticTrendFitter {
    capacity: f64,
    completion_threshold: f64,
    horizon_days: u32,
    fit: FitConfig,
}

impl LogisticTrendFitter {
    /// Create a fitter from engine configuration.
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            capacity: config.capacity,
            completion_threshold: config.completion_threshold,
            horizon_days: config.horizon_days,
            fit: config.fit.clone(),
        }
    }

    /// Fit curve parameters to a series.
    pub fn fit(&self, series: &ProgressSeries) -> Result<LogisticParams, FitError> {
        let distinct = series.distinct_timestamps();
        if distinct < self.fit.min_distinct_points {
            return Err(FitError::TooFewDistinctPoints {
                found: distinct,
                required: self.fit.min_distinct_points,
            });
        }

        let sorted = series.sorted_by_time();
        let origin = sorted[0].timestamp;
        let ts: Vec<f64> = sorted.iter().map(|o| days_between(origin, o.timestamp)).collect();
        let ys: Vec<f64> = sorted.iter().map(|o| o.progress).collect();

        let span = ts[ts.len() - 1] - ts[0];
        if span <= 0.0 {
            return Err(FitError::DegenerateVariance("time"));
        }
        let (y_min, y_max) = ys
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)));
        if y_max - y_min <= f64::EPSILON {
            return Err(FitError::DegenerateVariance("progress"));
        }

        let (rate, midpoint) = self.initial_guess(&ts, &ys, span);
        let (rate, midpoint, iterations, sse) = self.levenberg_marquardt(&ts, &ys, rate, midpoint)?;

        if !(rate.is_finite() && midpoint.is_finite()) {
            return Err(FitError::NumericalInstability(format!(
                "non-finite parameters (rate {rate}, midpoint {midpoint})"
            )));
        }
        debug!(rate, midpoint, iterations, sse, "Logistic fit converged");

        Ok(LogisticParams {
            capacity: self.capacity,
            rate,
            midpoint,
            origin,
        })
    }

    /// Project a fitted curve over the history and the horizon.
    pub fn project(
        &self,
        series: &ProgressSeries,
        params: &LogisticParams,
    ) -> Result<ProjectedCurve, FitError> {
        let sorted = series.sorted_by_time();
        let last = match sorted.last() {
            Some(o) => o.timestamp,
            None => return Ok(ProjectedCurve::default()),
        };

        let mut points = Vec::with_capacity(sorted.len() + self.horizon_days as usize);
        points.extend(sorted.iter().map(|o| ProjectedPoint {
            timestamp: o.timestamp,
            progress: params.value_at(o.timestamp),
        }));
        for day in 1..=i64::from(self.horizon_days) {
            let timestamp = last
                .checked_add_signed(Duration::days(day))
                .ok_or(FitError::HorizonOutOfRange)?;
            points.push(ProjectedPoint {
                timestamp,
                progress: params.value_at(timestamp),
            });
        }

        Ok(ProjectedCurve { points })
    }

    /// Logit linearisation: `ln(y / (C - y)) = k t - k m`.
    fn initial_guess(&self, ts: &[f64], ys: &[f64], span: f64) -> (f64, f64) {
        let lo = self.capacity * LOGIT_MARGIN;
        let hi = self.capacity - lo;
        let zs: Vec<f64> = ys
            .iter()
            .map(|&y| {
                let y = y.clamp(lo, hi);
                (y / (self.capacity - y)).ln()
            })
            .collect();

        let n = ts.len() as f64;
        let mean_t = ts.iter().sum::<f64>() / n;
        let mean_z = zs.iter().sum::<f64>() / n;
        let (cov, var) = ts.iter().zip(&zs).fold((0.0, 0.0), |(cov, var), (&t, &z)| {
            (cov + (t - mean_t) * (z - mean_z), var + (t - mean_t) * (t - mean_t))
        });

        let slope = cov / var;
        let rate = if slope.is_finite() && slope.abs() > 1e-9 {
            slope
        } else {
            1.0 / span
        };
        (rate, mean_t - mean_z / rate)
    }

    fn levenberg_marquardt(
        &self,
        ts: &[f64],
        ys: &[f64],
        mut rate: f64,
        mut midpoint: f64,
    ) -> Result<(f64, f64, usize, f64), FitError> {
        let c = self.capacity;
        let sse_of = |k: f64, m: f64| -> f64 {
            ts.iter()
                .zip(ys)
                .map(|(&t, &y)| {
                    let r = y - c / (1.0 + (-k * (t - m)).exp());
                    r * r
                })
                .sum()
        };

        let mut sse = sse_of(rate, midpoint);
        if !sse.is_finite() {
            return Err(FitError::NumericalInstability("initial residual is not finite".into()));
        }
        let mut lambda = LAMBDA_INITIAL;

        for iteration in 1..=self.fit.max_iterations {
            // Normal equations JᵀJ δ = Jᵀr for the two parameters.
            let (mut a11, mut a12, mut a22, mut g1, mut g2) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for (&t, &y) in ts.iter().zip(ys) {
                let s = 1.0 / (1.0 + (-rate * (t - midpoint)).exp());
                let slope = c * s * (1.0 - s);
                let d_rate = slope * (t - midpoint);
                let d_mid = -slope * rate;
                let r = y - c * s;
                a11 += d_rate * d_rate;
                a12 += d_rate * d_mid;
                a22 += d_mid * d_mid;
                g1 += d_rate * r;
                g2 += d_mid * r;
            }

            loop {
                let b11 = a11 + lambda * a11.max(1e-12);
                let b22 = a22 + lambda * a22.max(1e-12);
                let det = b11 * b22 - a12 * a12;
                if det.is_finite() && det.abs() > f64::MIN_POSITIVE {
                    let step_rate = (g1 * b22 - a12 * g2) / det;
                    let step_mid = (b11 * g2 - a12 * g1) / det;
                    let candidate = sse_of(rate + step_rate, midpoint + step_mid);
                    if candidate.is_finite() && candidate < sse {
                        rate += step_rate;
                        midpoint += step_mid;
                        let improvement = sse - candidate;
                        sse = candidate;
                        lambda = (lambda / 10.0).max(LAMBDA_MIN);
                        if improvement <= self.fit.tolerance * (1.0 + sse) {
                            return Ok((rate, midpoint, iteration, sse));
                        }
                        break;
                    }
                }
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    // No step improves the residual: we sit at a minimum.
                    return Ok((rate, midpoint, iteration, sse));
                }
            }
        }

        Err(FitError::NotConverged {
            iterations: self.fit.max_iterations,
        })
    }
}

impl Default for LogisticTrendFitter {
    fn default() -> Self {
        Self::new(&ForecastConfig::default())
    }
}

impl CompletionModel for LogisticTrendFitter {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn estimate(&self, series: &ProgressSeries) -> Result<CompletionEstimate, ModelError> {
        let params = self.fit(series)?;
        let curve = self.project(series, &params)?;
        Ok(match curve.first_reaching(self.completion_threshold) {
            Some(date) => CompletionEstimate::Reached(date),
            None => CompletionEstimate::NotWithinHorizon,
        })
    }
}

fn days_between(from: Time, to: Time) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finishline_core::ProgressObservation;

    fn origin() -> Time {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn at(days: i64) -> Time {
        origin() + Duration::days(days)
    }

    fn series(points: &[(i64, f64)]) -> ProgressSeries {
        ProgressSeries::new(
            points
                .iter()
                .map(|&(d, p)| ProgressObservation::new(at(d), p))
                .collect(),
        )
    }

    fn logistic_series(rate: f64, midpoint: f64, days: &[i64]) -> ProgressSeries {
        let points: Vec<(i64, f64)> = days
            .iter()
            .map(|&d| (d, 100.0 / (1.0 + (-rate * (d as f64 - midpoint)).exp())))
            .collect();
        series(&points)
    }

    #[test]
    fn test_recovers_known_curve() {
        let s = logistic_series(0.1, 60.0, &[0, 10, 20, 30, 40]);
        let params = LogisticTrendFitter::default().fit(&s).unwrap();
        assert!((params.rate - 0.1).abs() < 1e-4, "rate {}", params.rate);
        assert!((params.midpoint - 60.0).abs() < 1e-2, "midpoint {}", params.midpoint);
        assert_eq!(params.origin, origin());
    }

    #[test]
    fn test_completion_is_first_day_at_threshold() {
        // 99.5% is reached at 60 + ln(199) / 0.1 ≈ day 112.93
        let s = logistic_series(0.1, 60.0, &[40, 0, 20, 10, 30]);
        let estimate = LogisticTrendFitter::default().estimate(&s).unwrap();
        assert_eq!(estimate, CompletionEstimate::Reached(at(113)));
    }

    #[test]
    fn test_slow_growth_not_within_horizon() {
        // Completion near day 929, horizon ends at day 405
        let s = logistic_series(0.01, 400.0, &[0, 10, 20, 30, 40]);
        let estimate = LogisticTrendFitter::default().estimate(&s).unwrap();
        assert_eq!(estimate, CompletionEstimate::NotWithinHorizon);
    }

    #[test]
    fn test_noisy_history_reaches_completion() {
        let s = series(&[(0, 5.0), (7, 12.0), (14, 25.0), (21, 41.0), (28, 55.0)]);
        match LogisticTrendFitter::default().estimate(&s).unwrap() {
            CompletionEstimate::Reached(date) => assert!(date > at(28)),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_projection_is_chronological_and_bounded() {
        let s = series(&[(20, 30.0), (0, 5.0), (10, 12.0), (30, 52.0)]);
        let fitter = LogisticTrendFitter::default();
        let params = fitter.fit(&s).unwrap();
        let curve = fitter.project(&s, &params).unwrap();

        assert_eq!(curve.len(), 4 + 365);
        assert!(curve
            .points()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(curve.points().iter().all(|p| p.progress <= 100.0));
        assert_eq!(curve.points().last().map(|p| p.timestamp), Some(at(30 + 365)));
    }

    #[test]
    fn test_two_points_cannot_be_fitted() {
        let s = series(&[(0, 0.0), (31, 50.0)]);
        assert_eq!(
            LogisticTrendFitter::default().fit(&s),
            Err(FitError::TooFewDistinctPoints { found: 2, required: 3 })
        );
    }

    #[test]
    fn test_duplicate_timestamps_count_once() {
        let s = series(&[(0, 0.0), (0, 5.0), (10, 20.0), (10, 25.0)]);
        assert!(matches!(
            LogisticTrendFitter::default().fit(&s),
            Err(FitError::TooFewDistinctPoints { found: 2, .. })
        ));
    }

    #[test]
    fn test_flat_progress_is_degenerate() {
        let s = series(&[(0, 20.0), (5, 20.0), (10, 20.0)]);
        assert_eq!(
            LogisticTrendFitter::default().fit(&s),
            Err(FitError::DegenerateVariance("progress"))
        );
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let config = ForecastConfig {
            fit: FitConfig {
                max_iterations: 1,
                tolerance: 1e-300,
                ..FitConfig::default()
            },
            ..ForecastConfig::default()
        };
        let s = series(&[(0, 1.0), (7, 12.0), (14, 25.0), (21, 41.0), (28, 55.0)]);
        assert_eq!(
            LogisticTrendFitter::new(&config).fit(&s),
            Err(FitError::NotConverged { iterations: 1 })
        );
    }

    #[test]
    fn test_first_reaching_scans_in_order() {
        let curve = ProjectedCurve {
            points: vec![
                ProjectedPoint { timestamp: at(0), progress: 10.0 },
                ProjectedPoint { timestamp: at(1), progress: 99.6 },
                ProjectedPoint { timestamp: at(2), progress: 99.9 },
            ],
        };
        assert_eq!(curve.first_reaching(99.5), Some(at(1)));
        assert_eq!(curve.first_reaching(99.95), None);
    }
}
