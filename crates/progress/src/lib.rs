//! Completion forecasting (Layer 2)
//!
//! History validation, logistic trend fitting, linear fallback and
//! plausibility checks, sequenced by [`CompletionEstimator`].

#![warn(missing_docs)]

pub mod config;
pub mod validator;
pub mod model;
pub mod trend;
pub mod linear;
pub mod plausibility;
pub mod estimator;

pub use config::{ConfigError, FitConfig, ForecastConfig, MAX_HORIZON_DAYS};
pub use validator::HistoryValidator;
pub use model::{CompletionEstimate, CompletionModel};
pub use trend::{LogisticParams, LogisticTrendFitter, ProjectedCurve, ProjectedPoint};
pub use linear::LinearExtrapolator;
pub use plausibility::PlausibilityGuard;
pub use estimator::CompletionEstimator;
