//! History validation.
//!
//! Turns a raw request into a [`ProgressSeries`]. The check is
//! all-or-nothing: a single bad row rejects the whole history.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use finishline_core::{
    ForecastRequest, MalformedData, ProgressObservation, ProgressSeries, Time, ValidationError,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const DATE_FIELD: &str = "date";
const PROGRESS_FIELD: &str = "progress";

/// Naive layouts accepted besides RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Validates and normalizes raw progress history.
#[derive(Debug, Clone)]
pub struct HistoryValidator {
    min_observations: usize,
}

impl HistoryValidator {
    /// Create a validator requiring `min_observations` rows.
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    /// Validate a request. `None` stands for an absent request body.
    pub fn validate(
        &self,
        request: Option<&ForecastRequest>,
    ) -> Result<ProgressSeries, ValidationError> {
        let history = match request.and_then(|r| r.progress_history.as_ref()) {
            None | Some(Value::Null) => return Err(ValidationError::MissingData),
            Some(history) => history,
        };
        self.validate_history(history)
    }

    /// Validate a raw history value.
    pub fn validate_history(&self, history: &Value) -> Result<ProgressSeries, ValidationError> {
        let rows = match history {
            Value::Null => return Err(ValidationError::MissingData),
            Value::Array(rows) => rows,
            other => {
                return Err(MalformedData::InvalidFormat(format!(
                    "expected a list of observations, got {}",
                    value_kind(other)
                ))
                .into())
            }
        };

        // Counted before any row is parsed.
        if rows.len() < self.min_observations {
            debug!(found = rows.len(), "Insufficient observations");
            return Err(ValidationError::InsufficientData {
                found: rows.len(),
                required: self.min_observations,
            });
        }

        let records = rows
            .iter()
            .enumerate()
            .map(|(index, row)| match row {
                Value::Object(record) => Ok(record),
                other => Err(MalformedData::InvalidFormat(format!(
                    "row {index} is {}, expected an object",
                    value_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        for field in [DATE_FIELD, PROGRESS_FIELD] {
            if !records.iter().any(|r| r.contains_key(field)) {
                return Err(
                    MalformedData::InvalidFormat(format!("no row has a `{field}` field")).into(),
                );
            }
        }

        let observations = records
            .iter()
            .enumerate()
            .map(|(index, record)| parse_row(index, record))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!(error = %e, "Progress history contains missing or invalid values");
                e
            })?;

        Ok(ProgressSeries::new(observations))
    }
}

impl Default for HistoryValidator {
    fn default() -> Self {
        Self::new(2)
    }
}

fn parse_row(
    index: usize,
    record: &Map<String, Value>,
) -> Result<ProgressObservation, MalformedData> {
    let timestamp = parse_timestamp(record.get(DATE_FIELD)).map_err(|reason| {
        MalformedData::InvalidValue {
            index,
            field: DATE_FIELD,
            reason,
        }
    })?;
    let progress = parse_progress(record.get(PROGRESS_FIELD)).map_err(|reason| {
        MalformedData::InvalidValue {
            index,
            field: PROGRESS_FIELD,
            reason,
        }
    })?;
    Ok(ProgressObservation::new(timestamp, progress))
}

/// Parse a date or date-time string.
pub fn parse_timestamp(value: Option<&Value>) -> Result<Time, String> {
    let raw = match value {
        None | Some(Value::Null) => return Err("missing".to_string()),
        Some(Value::String(s)) => s.trim(),
        Some(other) => return Err(format!("expected a date string, got {}", value_kind(other))),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unrecognised date `{raw}`"))
}

/// Parse a progress value from a number or numeric string.
pub fn parse_progress(value: Option<&Value>) -> Result<f64, String> {
    let parsed = match value {
        None | Some(Value::Null) => return Err("missing".to_string()),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(format!("expected a number, got {}", value_kind(other))),
    };
    match parsed {
        Some(p) if p.is_finite() => Ok(p),
        _ => Err("not a finite number".to_string()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
