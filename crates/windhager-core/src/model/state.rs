// ── Point state ──
//
// Turns a descriptor plus a snapshot into the value a consumer shows:
// temperatures net of their correction point, select indices mapped to
// labels, pellet counters in tonnes.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::descriptor::{DeviceDescriptor, PointKind};
use super::snapshot::Snapshot;

/// Unit of the pellet consumption counters.
pub const PELLET_UNIT: &str = "t";

/// Interpreted state of one non-climate descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointState {
    Temperature {
        celsius: f64,
    },
    Measurement {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Label {
        label: String,
    },
    Counter {
        value: f64,
        unit: &'static str,
        increasing: bool,
    },
}

impl fmt::Display for PointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature { celsius } => write!(f, "{celsius} °C"),
            Self::Measurement { value, unit: None } => write!(f, "{value}"),
            Self::Measurement {
                value,
                unit: Some(unit),
            } => write!(f, "{value} {unit}"),
            Self::Label { label } => f.write_str(label),
            Self::Counter { value, unit, .. } => write!(f, "{value} {unit}"),
        }
    }
}

impl Snapshot {
    /// Interpret `descriptor` against this snapshot.
    ///
    /// `None` when the point has no reading, for out-of-range select
    /// values, and for climate descriptors (see
    /// [`crate::climate::ClimateZone`]). A correction point without a
    /// reading is treated as zero.
    pub fn state_of(&self, descriptor: &DeviceDescriptor) -> Option<PointState> {
        match &descriptor.kind {
            PointKind::Climate { .. } => None,
            PointKind::Temperature {
                oid,
                correction_oid,
            } => {
                let raw = self.number(oid.as_str())?;
                let correction = correction_oid
                    .as_ref()
                    .and_then(|c| self.number(c.as_str()))
                    .unwrap_or(0.0);
                Some(PointState::Temperature {
                    celsius: raw - correction,
                })
            }
            PointKind::Sensor { oid, unit, .. } => Some(PointState::Measurement {
                value: self.number(oid.as_str())?,
                unit: unit.clone(),
            }),
            PointKind::Select { oid, options } => {
                let value = self.value(oid.as_str())?;
                let label = value.as_index().and_then(|i| options.get(i));
                if label.is_none() {
                    warn!(
                        id = %descriptor.id,
                        value = %value,
                        options = options.len(),
                        "select value has no matching option"
                    );
                }
                label.map(|l| PointState::Label { label: l.clone() })
            }
            PointKind::Total { oid } => Some(PointState::Counter {
                value: self.number(oid.as_str())?,
                unit: PELLET_UNIT,
                increasing: false,
            }),
            PointKind::TotalIncreasing { oid } => Some(PointState::Counter {
                value: self.number(oid.as_str())?,
                unit: PELLET_UNIT,
                increasing: true,
            }),
        }
    }
}
