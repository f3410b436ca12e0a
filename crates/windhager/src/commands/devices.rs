//! Device command handler.

use tabled::Tabled;
use windhager_core::{Controller, DeviceDescriptor};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "OID")]
    oid: String,
}

impl From<&DeviceDescriptor> for DeviceRow {
    fn from(d: &DeviceDescriptor) -> Self {
        let oid = d
            .oid()
            .map(ToString::to_string)
            .or_else(|| d.climate_prefix().as_ref().map(ToString::to_string))
            .unwrap_or_default();
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            device: d.device_name.clone(),
            kind: d.kind_name(),
            oid,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: &DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let registry = controller.registry().await?;

    let devices: Vec<DeviceDescriptor> = registry
        .devices
        .iter()
        .filter(|d| args.kind.as_deref().is_none_or(|k| d.kind_name() == k))
        .cloned()
        .collect();

    let out = output::render_list(global.output, &devices, |d| DeviceRow::from(d), |d| d.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
