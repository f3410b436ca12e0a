// ── Full-tree scanner ──
//
// Diagnostic walk of the whole lookup tree: every device, every function
// with a non-negative type, every sensor category under it. Output goes
// to the log at `info`; nothing is registered or returned.

use serde::Serialize;
use tracing::{info, warn};
use windhager_api::{SensorGroup, WindhagerClient};

use crate::error::CoreError;
use crate::model::{FunctionPath, NodePath};

/// Counters for one scan, mostly for the caller's summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub devices: usize,
    pub functions: usize,
    pub sensor_groups: usize,
    pub readings: usize,
    /// Function or sensor listings that could not be fetched.
    pub errors: usize,
}

/// Walk and log the full tree.
///
/// Only the root listing is fatal; a failing function or sensor listing
/// is logged and skipped.
pub async fn full_system_scan(client: &WindhagerClient) -> Result<ScanSummary, CoreError> {
    let devices = client.devices().await?;
    let mut summary = ScanSummary {
        devices: devices.len(),
        ..ScanSummary::default()
    };

    for device in &devices {
        let node = NodePath::new(device.node_id);
        info!(
            node = %node,
            name = device.name.as_deref().unwrap_or_default(),
            "found device"
        );
        let Some(functions) = &device.functions else {
            continue;
        };

        for function in functions.iter().filter(|f| f.fct_type >= 0) {
            let path = node.function(function.fct_id);
            info!(
                path = %path,
                name = %function.name,
                fct_type = function.fct_type,
                lock = function.lock,
                "found function"
            );
            summary.functions += 1;
            scan_function(client, path, &mut summary).await;
        }
    }

    info!(
        devices = summary.devices,
        functions = summary.functions,
        sensor_groups = summary.sensor_groups,
        readings = summary.readings,
        errors = summary.errors,
        "full system scan complete"
    );
    Ok(summary)
}

async fn scan_function(client: &WindhagerClient, path: FunctionPath, summary: &mut ScanSummary) {
    let groups: Vec<SensorGroup> = match client.lookup(&path.to_string()).await {
        Ok(groups) => groups,
        Err(e) => {
            warn!(path = %path, error = %e, "failed to list sensors");
            summary.errors += 1;
            return;
        }
    };

    for group in groups {
        let sensors = path.sensors(group.id);
        info!(path = %sensors, count = ?group.count, "found sensors");
        summary.sensor_groups += 1;

        match client.lookup::<Vec<serde_json::Value>>(&sensors).await {
            Ok(readings) => {
                for reading in &readings {
                    info!(path = %sensors, reading = %reading, "found reading");
                }
                summary.readings += readings.len();
            }
            Err(e) => {
                warn!(path = %sensors, error = %e, "failed to read sensors");
                summary.errors += 1;
            }
        }
    }
}
