//! Snapshot command handler, and the snapshot views shared with `watch`.

use serde::Serialize;
use tabled::Tabled;
use windhager_core::{
    Bias, ClimateStatus, ClimateZone, Controller, DeviceDescriptor, NO_DATA, Oid, PointState,
    PointValue, Snapshot,
};

use crate::cli::{GlobalOpts, OutputFormat, SnapshotArgs};
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

/// One descriptor and what it currently reads.
#[derive(Serialize)]
struct DeviceReading<'a> {
    id: &'a str,
    name: &'a str,
    device: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    oid: Option<&'a Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<PointState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    climate: Option<ClimateStatus>,
}

impl<'a> DeviceReading<'a> {
    fn new(descriptor: &'a DeviceDescriptor, snapshot: &'a Snapshot) -> Self {
        Self {
            id: &descriptor.id,
            name: &descriptor.name,
            device: &descriptor.device_name,
            kind: descriptor.kind_name(),
            oid: descriptor.oid(),
            state: snapshot.state_of(descriptor),
            climate: ClimateZone::new(descriptor, snapshot).map(|zone| zone.status()),
        }
    }

    fn display_state(&self) -> String {
        if let Some(ref status) = self.climate {
            return climate_summary(status);
        }
        self.state
            .as_ref()
            .map_or_else(|| NO_DATA.to_owned(), ToString::to_string)
    }
}

/// One raw OID reading.
#[derive(Serialize)]
struct RawReading<'a> {
    oid: &'a Oid,
    value: Option<&'a PointValue>,
}

impl RawReading<'_> {
    fn display_value(&self) -> String {
        self.value
            .map_or_else(|| NO_DATA.to_owned(), ToString::to_string)
    }
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

#[derive(Tabled)]
struct RawRow {
    #[tabled(rename = "OID")]
    oid: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn fmt_temp(celsius: Option<f64>) -> String {
    celsius.map_or_else(|| NO_DATA.to_owned(), |t| format!("{t} °C"))
}

/// "20.5 °C → 21 °C, preset 3, heating"
pub fn climate_summary(status: &ClimateStatus) -> String {
    format!(
        "{} → {}, preset {}, {}",
        fmt_temp(status.current_temperature),
        fmt_temp(status.target_temperature),
        status.preset_mode,
        status.hvac_action
    )
}

// ── Rendering ───────────────────────────────────────────────────────

/// Render `snapshot` as interpreted device states, or as raw OID readings.
pub fn render(snapshot: &Snapshot, raw: bool, format: OutputFormat) -> String {
    if raw {
        let readings: Vec<RawReading<'_>> = snapshot
            .oids
            .iter()
            .map(|(oid, value)| RawReading {
                oid,
                value: value.as_ref(),
            })
            .collect();
        return output::render_list(
            format,
            &readings,
            |r| RawRow {
                oid: r.oid.to_string(),
                value: r.display_value(),
            },
            |r| format!("{}\t{}", r.oid, r.display_value()),
        );
    }

    let readings: Vec<DeviceReading<'_>> = snapshot
        .devices
        .iter()
        .map(|d| DeviceReading::new(d, snapshot))
        .collect();
    output::render_list(
        format,
        &readings,
        |r| ReadingRow {
            id: r.id.to_owned(),
            name: r.name.to_owned(),
            kind: r.kind,
            state: r.display_state(),
        },
        |r| format!("{}\t{}", r.id, r.display_state()),
    )
}

/// Warn on stderr about datapoints the last cycle could not read.
pub fn warn_failed(snapshot: &Snapshot, global: &GlobalOpts) {
    if snapshot.is_complete() {
        return;
    }
    let failed: Vec<&str> = snapshot.failed.iter().map(Oid::as_str).collect();
    output::print_warning(
        &format!(
            "{} datapoint(s) could not be read: {}",
            failed.len(),
            failed.join(", ")
        ),
        global.color,
    );
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: &SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = controller.refresh().await?;
    warn_failed(&snapshot, global);

    let out = render(&snapshot, args.raw, global.output);
    output::print_output(&out, global.quiet);
    Ok(())
}
