//! Shared helpers for command handlers.

use windhager_core::{ClimateZone, FunctionPath, Oid, Snapshot};

use crate::error::CliError;

/// Parse a datapoint OID argument.
pub fn parse_oid(input: &str) -> Result<Oid, CliError> {
    input.trim().parse().map_err(|e: windhager_core::OidError| CliError::Validation {
        field: "oid".into(),
        reason: e.to_string(),
    })
}

/// Pick the zone a climate command applies to.
///
/// `selector` matches a descriptor id, a zone name (case-insensitive) or
/// a function path. Without one, the snapshot must hold exactly one zone.
pub fn resolve_zone(snapshot: &Snapshot, selector: Option<&str>) -> Result<FunctionPath, CliError> {
    let zones: Vec<ClimateZone<'_>> = ClimateZone::all(snapshot).collect();

    let Some(selector) = selector.map(str::trim) else {
        return match zones.as_slice() {
            [zone] => Ok(zone.prefix()),
            [] => Err(CliError::NotFound {
                resource_type: "zone".into(),
                identifier: "(any)".into(),
                list_command: "climate status".into(),
            }),
            many => Err(CliError::Validation {
                field: "zone".into(),
                reason: format!(
                    "{} zones found, pick one with --zone: {}",
                    many.len(),
                    many.iter()
                        .map(|z| z.descriptor().id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        };
    };

    let path = selector.parse::<FunctionPath>().ok();
    zones
        .iter()
        .find(|zone| {
            let d = zone.descriptor();
            d.id == selector || d.name.eq_ignore_ascii_case(selector) || path == Some(zone.prefix())
        })
        .map(ClimateZone::prefix)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "zone".into(),
            identifier: selector.into(),
            list_command: "climate status".into(),
        })
}
