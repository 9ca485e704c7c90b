//! Forecast engine configuration.

use serde::{Deserialize, Serialize};

/// Longest projection horizon accepted, about a century.
pub const MAX_HORIZON_DAYS: u32 = 36_500;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("invalid config field {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Engine configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Growth ceiling of the trend model (percent)
    pub capacity: f64,

    /// Projected progress counted as complete
    pub completion_threshold: f64,

    /// Days projected past the latest observation
    pub horizon_days: u32,

    /// Predictions further than this from "now" are flagged
    pub far_future_days: u32,

    /// Whether the trend model runs at all
    pub trend_fit_enabled: bool,

    /// Trend fitting parameters
    pub fit: FitConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            completion_threshold: 99.5,
            horizon_days: 365,
            far_future_days: 730,
            trend_fit_enabled: true,
            fit: FitConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load from a JSON document. Missing fields take defaults.
    pub fn from_json(body: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(body).map_err(|e| ConfigError::Invalid {
            field: "config",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Disable the trend model, forcing linear extrapolation.
    pub fn linear_only(mut self) -> Self {
        self.trend_fit_enabled = false;
        self
    }

    /// Check that values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.capacity.is_finite() && self.capacity > 0.0) {
            return Err(invalid("capacity", "must be a positive number"));
        }
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= self.capacity) {
            return Err(invalid("completion_threshold", "must lie in (0, capacity]"));
        }
        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(invalid(
                "horizon_days",
                &format!("must lie in [1, {MAX_HORIZON_DAYS}]"),
            ));
        }
        self.fit.validate()
    }
}

/// Levenberg–Marquardt settings for the trend fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Iteration cap
    pub max_iterations: usize,

    /// Relative change in squared error treated as converged
    pub tolerance: f64,

    /// Distinct timestamps required to attempt a fit
    pub min_distinct_points: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
            min_distinct_points: 3,
        }
    }
}

impl FitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(invalid("fit.max_iterations", "must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid("fit.tolerance", "must be a positive number"));
        }
        if self.min_distinct_points < 3 {
            return Err(invalid("fit.min_distinct_points", "must be at least 3"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
