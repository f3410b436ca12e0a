//! Command dispatch: bridges CLI args -> core Controller -> output formatting.

pub mod climate;
pub mod config_cmd;
pub mod devices;
pub mod points;
pub mod scan;
pub mod snapshot;
pub mod util;
pub mod watch;

use windhager_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(controller, &args, global).await,
        Command::Snapshot(args) => snapshot::handle(controller, &args, global).await,
        Command::Get { oid } => points::get(controller, &oid, global).await,
        Command::Set { oid, value } => points::set(controller, &oid, &value, global).await,
        Command::Climate(args) => climate::handle(controller, args, global).await,
        Command::Scan => scan::handle(controller, global).await,
        Command::Watch(args) => watch::handle(controller, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
