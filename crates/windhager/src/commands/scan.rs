//! Full-tree scan handler. The readings themselves go to the log.

use windhager_core::{Controller, ScanSummary};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(s: &ScanSummary) -> String {
    [
        format!("Devices:       {}", s.devices),
        format!("Functions:     {}", s.functions),
        format!("Sensor groups: {}", s.sensor_groups),
        format!("Readings:      {}", s.readings),
        format!("Errors:        {}", s.errors),
    ]
    .join("\n")
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let summary = controller.full_system_scan().await?;

    let out = output::render_single(global.output, &summary, detail, |s| {
        format!(
            "devices={} functions={} sensor_groups={} readings={} errors={}",
            s.devices, s.functions, s.sensor_groups, s.readings, s.errors
        )
    });
    output::print_output(&out, global.quiet);

    if summary.errors > 0 {
        output::print_warning(
            &format!("{} listing(s) could not be fetched, see log", summary.errors),
            global.color,
        );
    }
    Ok(())
}
