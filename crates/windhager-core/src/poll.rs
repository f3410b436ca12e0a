// ── Poll engine ──
//
// Reads every registered OID once. A failing OID costs that OID only:
// it is recorded as `None`, listed in `failed`, and the cycle carries on.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, warn};
use windhager_api::{Error, WindhagerClient};

use crate::discovery::Registry;
use crate::model::{Oid, PointValue, Snapshot};

/// Fetch every OID in `registry` and assemble a snapshot.
pub async fn poll(client: &WindhagerClient, registry: &Registry) -> Snapshot {
    let mut oids = IndexMap::with_capacity(registry.oids.len());
    let mut failed = Vec::new();

    for oid in &registry.oids {
        let value = match read(client, oid).await {
            Ok(value) => value,
            Err(e) => {
                warn!(oid = %oid, error = %e, "failed to read OID");
                failed.push(oid.clone());
                None
            }
        };
        oids.insert(oid.clone(), value);
    }

    debug!(
        oids = oids.len(),
        failed = failed.len(),
        "poll cycle complete"
    );
    Snapshot {
        devices: Arc::clone(&registry.devices),
        oids,
        failed,
        taken_at: Utc::now(),
    }
}

/// Read one OID. `Ok(None)` when the appliance has no reading for it.
pub async fn read(client: &WindhagerClient, oid: &Oid) -> Result<Option<PointValue>, Error> {
    let body = client.lookup::<serde_json::Value>(oid.as_str()).await?;
    let value = PointValue::from_lookup(&body);
    if value.is_none() {
        debug!(oid = %oid, body = %body, "no reading for OID");
    }
    Ok(value)
}
