//! Raw forecast request, as received from a caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw forecast request.
///
/// The history is kept as untyped JSON so that validation can tell a
/// missing field apart from a malformed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    /// Raw progress history, expected to be `[{date, progress}, ...]`
    #[serde(default)]
    pub progress_history: Option<Value>,
}

impl ForecastRequest {
    /// Create a request from a raw history value.
    pub fn new(history: Value) -> Self {
        Self {
            progress_history: Some(history),
        }
    }

    /// Parse a request from a JSON document.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_camel_case_field() {
        let req = ForecastRequest::from_json(
            r#"{"progressHistory": [{"date": "2024-01-01", "progress": 0}]}"#,
        )
        .unwrap();
        assert_eq!(
            req.progress_history,
            Some(json!([{"date": "2024-01-01", "progress": 0}]))
        );
    }

    #[test]
    fn test_missing_field_is_none() {
        let req = ForecastRequest::from_json(r#"{"other": 1}"#).unwrap();
        assert!(req.progress_history.is_none());
    }
}
