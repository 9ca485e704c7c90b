//! Forecast result model.

use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use crate::Time;

/// How far a produced completion date can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    /// Within the plausibility window
    Confident,
    /// Beyond the plausibility window; returned but flagged
    FarFuture,
}

/// Result class consumed by transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// Missing or malformed input
    ClientError,
    /// Every normal outcome, including "cannot predict"
    Success,
    /// Unhandled internal fault
    ServerError,
}

impl StatusClass {
    /// HTTP status code equivalent.
    pub fn http_code(&self) -> u16 {
        match self {
            StatusClass::ClientError => 400,
            StatusClass::Success => 200,
            StatusClass::ServerError => 500,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::ClientError => "client_error",
            StatusClass::Success => "success",
            StatusClass::ServerError => "server_error",
        }
    }
}

/// Semantic outcome of one forecast invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No history field in the request
    MissingHistory,
    /// Fewer observations than the engine needs
    InsufficientData,
    /// History is structurally wrong (not a list of records)
    InvalidFormat,
    /// Some row carries a missing or unparseable value
    InvalidValues,
    /// Progress already reached 100%
    AlreadyComplete,
    /// Trend model reached the completion threshold
    Predicted(Confidence),
    /// Trend model never reached the threshold within the horizon
    NotInWindow,
    /// Trend model failed; linear extrapolation produced a date
    Fallback(Confidence),
    /// Both models failed
    Unable,
    /// Unanticipated fault inside the engine
    InternalError,
}

impl Outcome {
    /// Result class for transport mapping.
    pub fn status_class(&self) -> StatusClass {
        match self {
            Outcome::MissingHistory | Outcome::InvalidFormat | Outcome::InvalidValues => {
                StatusClass::ClientError
            }
            Outcome::InternalError => StatusClass::ServerError,
            _ => StatusClass::Success,
        }
    }

    /// Caller-facing message, if the outcome carries one.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::MissingHistory => Some("Missing progress history data"),
            Outcome::InsufficientData => Some("Need at least 2 data points for prediction"),
            Outcome::InvalidFormat => Some("Invalid data format"),
            Outcome::InvalidValues => Some("Data contains missing or invalid values"),
            Outcome::AlreadyComplete => Some("Project already complete"),
            Outcome::Predicted(Confidence::Confident) => None,
            Outcome::Predicted(Confidence::FarFuture) => {
                Some("Prediction is far in the future and may be unreliable")
            }
            Outcome::NotInWindow => Some("Completion not predicted within forecast window"),
            Outcome::Fallback(Confidence::Confident) => {
                Some("Prediction based on linear extrapolation (fallback method)")
            }
            Outcome::Fallback(Confidence::FarFuture) => Some(
                "Prediction based on linear extrapolation (fallback method); \
                 far in the future and may be unreliable",
            ),
            Outcome::Unable => Some("Unable to calculate completion date"),
            Outcome::InternalError => Some("Internal server error"),
        }
    }

    /// Whether this outcome carries a completion date.
    pub fn has_date(&self) -> bool {
        matches!(
            self,
            Outcome::AlreadyComplete | Outcome::Predicted(_) | Outcome::Fallback(_)
        )
    }
}

/// Advisory conditions noticed while forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastWarning {
    /// Progress decreased at least once in time order
    NonMonotonicProgress,
}

/// The structured answer of one forecast invocation.
///
/// Serializes to `{"predictedCompletionDate": ..., "message": ...}`; the
/// outcome itself stays out of the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    /// Predicted completion date, if any
    #[serde(serialize_with = "serialize_date")]
    pub predicted_completion_date: Option<Time>,

    /// Informational or warning message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Advisory warnings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ForecastWarning>,

    /// Semantic outcome
    #[serde(skip)]
    pub outcome: Outcome,
}

impl ForecastResult {
    /// Build a result for an outcome. The message follows the outcome.
    pub fn new(outcome: Outcome, predicted_completion_date: Option<Time>) -> Self {
        Self {
            predicted_completion_date,
            message: outcome.message().map(str::to_string),
            warnings: Vec::new(),
            outcome,
        }
    }

    /// Result without a date.
    pub fn without_date(outcome: Outcome) -> Self {
        Self::new(outcome, None)
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<ForecastWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Result class for transport mapping.
    pub fn status_class(&self) -> StatusClass {
        self.outcome.status_class()
    }
}

fn serialize_date<S: Serializer>(date: &Option<Time>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_status_classes() {
        assert_eq!(Outcome::MissingHistory.status_class(), StatusClass::ClientError);
        assert_eq!(Outcome::InvalidValues.status_class(), StatusClass::ClientError);
        assert_eq!(Outcome::InsufficientData.status_class(), StatusClass::Success);
        assert_eq!(Outcome::Unable.status_class(), StatusClass::Success);
        assert_eq!(Outcome::NotInWindow.status_class(), StatusClass::Success);
        assert_eq!(Outcome::InternalError.status_class(), StatusClass::ServerError);
        assert_eq!(StatusClass::ServerError.http_code(), 500);
        assert_eq!(StatusClass::ClientError.as_str(), "client_error");
    }

    #[test]
    fn test_serializes_date_and_message() {
        let date = Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap();
        let result = ForecastResult::new(Outcome::Fallback(Confidence::Confident), Some(date));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "predictedCompletionDate": "2024-03-03T00:00:00Z",
                "message": "Prediction based on linear extrapolation (fallback method)"
            })
        );
    }

    #[test]
    fn test_confident_prediction_omits_message() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let result = ForecastResult::new(Outcome::Predicted(Confidence::Confident), Some(date));
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("message").is_none());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_null_date_with_warnings() {
        let result = ForecastResult::without_date(Outcome::Unable)
            .with_warnings(vec![ForecastWarning::NonMonotonicProgress]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "predictedCompletionDate": null,
                "message": "Unable to calculate completion date",
                "warnings": ["non_monotonic_progress"]
            })
        );
    }
}
