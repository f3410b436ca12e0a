//! Periodic polling until interrupted.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;
use windhager_core::Controller;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::snapshot;

pub async fn handle(
    controller: &Controller,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let secs = args
        .interval
        .unwrap_or(controller.config().refresh_interval_secs);
    if secs == 0 {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            _ = interval.tick() => {
                match controller.refresh().await {
                    Ok(snap) => {
                        snapshot::warn_failed(&snap, global);
                        if global.output == OutputFormat::Table && !global.quiet {
                            println!("── {} ──", snap.taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
                        }
                        output::print_output(
                            &snapshot::render(&snap, args.raw, global.output),
                            global.quiet,
                        );
                    }
                    // Transient: keep watching on the last good snapshot.
                    Err(e) if e.is_timeout() || e.is_connection_failure() => {
                        output::print_warning(&e.to_string(), global.color);
                    }
                    Err(e) => return Err(e.into()),
                }

                polls += 1;
                if args.count.is_some_and(|n| polls >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}
