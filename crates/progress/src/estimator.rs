//! Completion date estimation.
//!
//! [`CompletionEstimator`] sequences validation, the short-circuit rules,
//! the trend model, the linear fallback and the plausibility guard. It is
//! a pure function of `(request, now)`: nothing is cached between calls.

use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use finishline_core::{
    Confidence, FitError, ForecastRequest, ForecastResult, ForecastWarning, ModelError,
    Outcome, ProgressSeries, Time, ValidationError,
};
use tracing::{error, info, warn};

use crate::config::ForecastConfig;
use crate::linear::LinearExtrapolator;
use crate::model::{CompletionEstimate, CompletionModel};
use crate::plausibility::PlausibilityGuard;
use crate::trend::LogisticTrendFitter;
use crate::validator::HistoryValidator;

/// Completion date estimator.
pub struct CompletionEstimator {
    config: ForecastConfig,
    validator: HistoryValidator,
    guard: PlausibilityGuard,
    primary: Box<dyn CompletionModel>,
    fallback: Box<dyn CompletionModel>,
}

impl CompletionEstimator {
    /// Create an estimator. The config is expected to be validated.
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            validator: HistoryValidator::default(),
            guard: PlausibilityGuard::new(config.capacity, config.far_future_days),
            primary: Box::new(LogisticTrendFitter::new(&config)),
            fallback: Box::new(LinearExtrapolator::new(config.capacity)),
            config,
        }
    }

    /// Replace the primary model.
    pub fn with_primary(mut self, model: Box<dyn CompletionModel>) -> Self {
        self.primary = model;
        self
    }

    /// Replace the fallback model.
    pub fn with_fallback(mut self, model: Box<dyn CompletionModel>) -> Self {
        self.fallback = model;
        self
    }

    /// Forecast against the system clock.
    pub fn forecast_now(&self, request: Option<&ForecastRequest>) -> ForecastResult {
        self.forecast(request, Utc::now())
    }

    /// Forecast a raw request. `None` stands for an absent request body.
    ///
    /// Never panics: an unanticipated fault becomes
    /// [`Outcome::InternalError`].
    pub fn forecast(&self, request: Option<&ForecastRequest>, now: Time) -> ForecastResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(request, now))) {
            Ok(result) => result,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%reason, "Unhandled fault while forecasting");
                ForecastResult::without_date(Outcome::InternalError)
            }
        }
    }

    fn run(&self, request: Option<&ForecastRequest>, now: Time) -> ForecastResult {
        info!("Received forecast request");
        match self.validator.validate(request) {
            Ok(series) => self.forecast_series(&series, now),
            Err(e) => {
                match &e {
                    ValidationError::InsufficientData { .. } => {
                        info!("Insufficient data points for prediction")
                    }
                    _ => warn!(error = %e, "Rejected progress history"),
                }
                ForecastResult::without_date(e.outcome())
            }
        }
    }

    /// Forecast an already validated series.
    pub fn forecast_series(&self, series: &ProgressSeries, now: Time) -> ForecastResult {
        if let Some(latest) = self.guard.already_complete(series) {
            info!(%latest, "Project already complete");
            return ForecastResult::new(Outcome::AlreadyComplete, Some(latest));
        }

        let mut warnings = Vec::new();
        if !series.is_non_decreasing() {
            // Advisory only; forecasting continues.
            warn!("Project progress is not consistently increasing");
            warnings.push(ForecastWarning::NonMonotonicProgress);
        }

        let result = match self.estimate_primary(series) {
            Ok(CompletionEstimate::Reached(date)) => {
                let confidence = self.guard.classify(date, now);
                self.log_prediction(self.primary.name(), date, confidence);
                ForecastResult::new(Outcome::Predicted(confidence), Some(date))
            }
            Ok(CompletionEstimate::NotWithinHorizon) => {
                info!("Could not predict completion within the forecast period");
                ForecastResult::without_date(Outcome::NotInWindow)
            }
            Err(e) => {
                warn!(model = self.primary.name(), error = %e, "Trend model failed, falling back");
                self.estimate_fallback(series, now)
            }
        };

        result.with_warnings(warnings)
    }

    fn estimate_primary(&self, series: &ProgressSeries) -> Result<CompletionEstimate, ModelError> {
        if !self.config.trend_fit_enabled {
            return Err(FitError::Disabled.into());
        }
        self.primary.estimate(series)
    }

    fn estimate_fallback(&self, series: &ProgressSeries, now: Time) -> ForecastResult {
        match self.fallback.estimate(series) {
            Ok(CompletionEstimate::Reached(date)) => {
                let confidence = self.guard.classify(date, now);
                self.log_prediction(self.fallback.name(), date, confidence);
                ForecastResult::new(Outcome::Fallback(confidence), Some(date))
            }
            Ok(CompletionEstimate::NotWithinHorizon) => {
                info!(model = self.fallback.name(), "Fallback found no completion");
                ForecastResult::without_date(Outcome::Unable)
            }
            Err(e) => {
                warn!(model = self.fallback.name(), error = %e, "Fallback calculation failed");
                ForecastResult::without_date(Outcome::Unable)
            }
        }
    }

    fn log_prediction(&self, model: &str, date: Time, confidence: Confidence) {
        match confidence {
            Confidence::Confident => {
                info!(model, %date, "Predicted completion date")
            }
            Confidence::FarFuture => {
                warn!(model, %date, "Predicted completion date is very far in the future")
            }
        }
    }
}

impl Default for CompletionEstimator {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}
