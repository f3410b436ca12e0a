//! Climate zone command handlers.

use tabled::Tabled;
use windhager_core::{
    Bias, ClimateCommand as CoreClimateCommand, ClimateStatus, ClimateZone, Controller, NO_DATA,
};

use crate::cli::{ClimateArgs, ClimateCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{snapshot, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Comfort ±")]
    compensation: String,
    #[tabled(rename = "Preset")]
    preset: u8,
    #[tabled(rename = "Action")]
    action: String,
}

fn fmt_num(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| NO_DATA.to_owned(), |v| format!("{v} {unit}"))
}

fn zone_row(status: &ClimateStatus, bias: Bias) -> ZoneRow {
    let (current, target) = match bias {
        Bias::Compensated => (status.current_temperature, status.target_temperature),
        Bias::Raw => (status.current_temperature_raw, status.target_temperature_raw),
    };
    ZoneRow {
        id: status.id.clone(),
        name: status.name.clone(),
        path: status.prefix.to_string(),
        current: fmt_num(current, "°C"),
        target: fmt_num(target, "°C"),
        compensation: fmt_num(status.comfort_compensation, "K"),
        preset: status.preset_mode,
        action: status.hvac_action.to_string(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ClimateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Every climate command needs a current view of the zones.
    let snap = controller.refresh().await?;
    snapshot::warn_failed(&snap, global);

    let (command, zone) = match args.command {
        ClimateCommand::Status { raw } => {
            let bias = if raw { Bias::Raw } else { Bias::Compensated };
            let statuses: Vec<ClimateStatus> =
                ClimateZone::all(&snap).map(|zone| zone.status()).collect();
            let out = output::render_list(
                global.output,
                &statuses,
                |s| zone_row(s, bias),
                |s| format!("{}\t{}", s.id, snapshot::climate_summary(s)),
            );
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        ClimateCommand::SetTemp { celsius, zone } => {
            (CoreClimateCommand::SetTargetTemperature { celsius }, zone)
        }
        ClimateCommand::SetPreset { mode, zone } => {
            (CoreClimateCommand::SetPresetMode { mode }, zone)
        }
        ClimateCommand::SetCompensation { kelvin, zone } => {
            (CoreClimateCommand::SetComfortCompensation { kelvin }, zone)
        }
    };

    let prefix = util::resolve_zone(&snap, zone.zone.as_deref())?;
    controller.climate(prefix, command).await?;

    let message = match command {
        CoreClimateCommand::SetTargetTemperature { celsius } => {
            format!("Zone {prefix}: holding {celsius} °C")
        }
        CoreClimateCommand::SetPresetMode { mode } => format!("Zone {prefix}: preset {mode}"),
        CoreClimateCommand::SetComfortCompensation { kelvin } => {
            format!("Zone {prefix}: comfort correction {kelvin} K")
        }
    };
    output::print_success(&message, global.color, global.quiet);
    Ok(())
}
