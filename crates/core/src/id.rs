//! Unique identifiers for forecast invocations.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a single forecast invocation.
///
/// Used only to correlate log events; it never appears in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastId(Ulid);

impl ForecastId {
    /// Generate a new ForecastId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ForecastId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ForecastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ForecastId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
