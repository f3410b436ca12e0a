//! Single-datapoint reads and writes.

use serde::Serialize;
use windhager_core::{Controller, NO_DATA, Oid, PointValue};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Reading {
    oid: Oid,
    value: Option<PointValue>,
}

impl Reading {
    fn display_value(&self) -> String {
        self.value
            .as_ref()
            .map_or_else(|| NO_DATA.to_owned(), ToString::to_string)
    }
}

pub async fn get(controller: &Controller, oid: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let oid = util::parse_oid(oid)?;
    let value = controller.read_oid(&oid).await?;
    let reading = Reading { oid, value };

    let out = output::render_single(
        global.output,
        &reading,
        |r| format!("OID:   {}\nValue: {}", r.oid, r.display_value()),
        |r| r.value.as_ref().map(ToString::to_string).unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn set(
    controller: &Controller,
    oid: &str,
    value: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let oid = util::parse_oid(oid)?;
    controller.write_oid(&oid, value).await?;
    output::print_success(&format!("Wrote {value} to {oid}"), global.color, global.quiet);
    Ok(())
}
