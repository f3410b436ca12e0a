// ── Device descriptors ──
//
// What discovery produces: one descriptor per user-facing entity, each
// naming the OIDs it reads. Descriptors are immutable once published.

use serde::{Deserialize, Serialize};

use super::oid::{FunctionPath, Oid, PointAddress};

/// One discovered entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable across runs for the same host and tree.
    pub id: String,
    pub name: String,
    /// Groups descriptors that belong to the same physical node.
    pub device_id: String,
    pub device_name: String,
    #[serde(flatten)]
    pub kind: PointKind,
}

/// Kind-specific payload, serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointKind {
    /// A heating zone. `oids` are node-relative (`/<fct>/<c>/<p>/<i>`).
    Climate {
        prefix: FunctionPath,
        oids: Vec<String>,
    },
    /// A temperature, optionally reported net of a correction point.
    Temperature {
        oid: Oid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correction_oid: Option<Oid>,
    },
    Sensor {
        oid: Oid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_class: Option<DeviceClass>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state_class: Option<StateClass>,
    },
    /// An enumerated status; the point value indexes `options`.
    Select { oid: Oid, options: Vec<String> },
    Total { oid: Oid },
    TotalIncreasing { oid: Oid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    PowerFactor,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

impl DeviceDescriptor {
    /// `climate`, `temperature`, `sensor`, `select`, `total` or `total_increasing`.
    pub fn kind_name(&self) -> &'static str {
        (&self.kind).into()
    }

    /// The point this descriptor reports, for every kind but climate.
    pub fn oid(&self) -> Option<&Oid> {
        match &self.kind {
            PointKind::Climate { .. } => None,
            PointKind::Temperature { oid, .. }
            | PointKind::Sensor { oid, .. }
            | PointKind::Select { oid, .. }
            | PointKind::Total { oid }
            | PointKind::TotalIncreasing { oid } => Some(oid),
        }
    }

    /// The zone prefix, for climate descriptors.
    pub fn climate_prefix(&self) -> Option<FunctionPath> {
        match &self.kind {
            PointKind::Climate { prefix, .. } => Some(*prefix),
            _ => None,
        }
    }

    /// Every fully qualified OID this descriptor reads.
    ///
    /// Climate entries are resolved against the node of their prefix;
    /// entries that do not parse are skipped.
    pub fn referenced_oids(&self) -> Vec<Oid> {
        match &self.kind {
            PointKind::Climate { prefix, oids } => oids
                .iter()
                .filter_map(|relative| resolve_relative(*prefix, relative))
                .collect(),
            PointKind::Temperature {
                oid,
                correction_oid,
            } => std::iter::once(oid.clone())
                .chain(correction_oid.iter().cloned())
                .collect(),
            PointKind::Sensor { oid, .. }
            | PointKind::Select { oid, .. }
            | PointKind::Total { oid }
            | PointKind::TotalIncreasing { oid } => vec![oid.clone()],
        }
    }
}

/// `/<fct>/<c>/<p>/<i>` under the node of `prefix`.
fn resolve_relative(prefix: FunctionPath, relative: &str) -> Option<Oid> {
    let rest = relative.strip_prefix('/')?;
    let (fct, address) = rest.split_once('/')?;
    let fct_id = fct.parse().ok()?;
    let address: PointAddress = format!("/{address}").parse().ok()?;
    Some(prefix.node().function(fct_id).point(address))
}
