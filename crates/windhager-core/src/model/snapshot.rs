// ── Poll snapshots ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::descriptor::DeviceDescriptor;
use super::oid::Oid;
use super::value::PointValue;

/// The result of one poll cycle.
///
/// `oids` holds exactly the registered OIDs, in discovery order. A `None`
/// entry means no reading this cycle: the appliance reported no data, or
/// the fetch failed (in which case the OID is also listed in `failed`).
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub devices: Arc<Vec<DeviceDescriptor>>,
    pub oids: IndexMap<Oid, Option<PointValue>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<Oid>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// The reading at `oid`, if registered and present.
    pub fn value(&self, oid: &str) -> Option<&PointValue> {
        self.oids.get(oid).and_then(Option::as_ref)
    }

    /// The numeric reading at `oid`.
    pub fn number(&self, oid: &str) -> Option<f64> {
        self.value(oid).and_then(PointValue::as_f64)
    }

    /// Whether every registered OID was fetched without error.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of OIDs that carry a reading.
    pub fn readings(&self) -> usize {
        self.oids.values().filter(|v| v.is_some()).count()
    }

    pub fn device(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        let mut oids = IndexMap::new();
        oids.insert("/1/7/2/0/1/0".parse().unwrap(), Some(PointValue::Number(20.3)));
        oids.insert("/1/7/2/1/1/0".parse().unwrap(), None);
        oids.insert(
            "/1/7/2/3/50/0".parse().unwrap(),
            Some(PointValue::Text("Auto".into())),
        );
        Snapshot {
            devices: Arc::new(Vec::new()),
            oids,
            failed: vec!["/1/7/2/1/1/0".parse().unwrap()],
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn lookups_flatten_missing_values() {
        let snap = snapshot();
        assert_eq!(snap.number("/1/7/2/0/1/0"), Some(20.3));
        assert_eq!(snap.value("/1/7/2/1/1/0"), None);
        assert_eq!(snap.number("/1/7/2/3/50/0"), None);
        assert_eq!(snap.value("/1/9/9/9/9/9"), None);
        assert_eq!(snap.readings(), 2);
        assert!(!snap.is_complete());
    }

    #[test]
    fn serializes_oids_in_order_with_nulls() {
        let json = serde_json::to_value(snapshot()).unwrap();
        let keys: Vec<&String> = json["oids"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["/1/7/2/0/1/0", "/1/7/2/1/1/0", "/1/7/2/3/50/0"]);
        assert!(json["oids"]["/1/7/2/1/1/0"].is_null());
        assert_eq!(json["oids"]["/1/7/2/3/50/0"], "Auto");
    }
}
