// ── Point values ──
//
// The lookup API reports every reading as a string under `value`.
// Numbers are decoded eagerly; the appliance's no-data sentinel and
// anything unreadable collapse to `None` at the snapshot level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder the appliance reports for a point without a current reading.
pub const NO_DATA: &str = "-.-";

/// One decoded reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Number(f64),
    Text(String),
}

impl PointValue {
    /// Decode the raw `value` string of a lookup response.
    ///
    /// Returns `None` for the no-data sentinel and for blank strings.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == NO_DATA {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Self::Number(n)),
            _ => Some(Self::Text(raw.to_owned())),
        }
    }

    /// Extract the reading from a lookup response body (`{"value": ...}`).
    pub fn from_lookup(body: &serde_json::Value) -> Option<Self> {
        match body.get("value")? {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// The value as a list index, when it is a non-negative integer.
    #[allow(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn as_index(&self) -> Option<usize> {
        let n = self.as_f64()?;
        if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
            Some(n as usize)
        } else {
            None
        }
    }

    /// The string to send back in a datapoint write.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq<f64> for PointValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64()
            .is_some_and(|n| (n - other).abs() < f64::EPSILON)
    }
}

impl From<f64> for PointValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}
