// ── Discovery engine ──
//
// Walks the root device list once and turns every supported, unlocked
// function into descriptors plus the set of OIDs to poll.

pub mod catalog;
mod cell;

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, info};
use windhager_api::{FunctionDescriptor, NodeDevice, WindhagerClient};

use crate::error::CoreError;
use crate::model::{DeviceDescriptor, FunctionPath, NodePath, Oid, PointKind, slug};

use self::catalog::{
    CLIMATE_AUXILIARY, CLIMATE_DESCRIPTOR_POINTS, CLIMATE_FUNCTION_TYPE, CLIMATE_POLLED,
    HEATER_FUNCTION_TYPE, HEATER_POINTS, PointTemplate, Presentation,
};

pub use self::cell::DiscoveryPhase;
pub(crate) use self::cell::RegistryCell;

/// The outcome of discovery: what to present and what to poll.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Descriptors in discovery order.
    pub devices: Arc<Vec<DeviceDescriptor>>,
    /// Every OID to poll, unique, in first-registration order.
    pub oids: IndexSet<Oid>,
}

impl Registry {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Fetch the root device list and discover from it.
pub async fn fetch_and_discover(
    client: &WindhagerClient,
    host: &str,
) -> Result<Registry, CoreError> {
    let devices = client.devices().await?;
    Ok(discover(host, &devices))
}

/// Build the registry from a root device list.
///
/// `host` is mixed into every descriptor id so that two appliances never
/// collide.
pub fn discover(host: &str, devices: &[NodeDevice]) -> Registry {
    let mut builder = Builder {
        host,
        devices: Vec::new(),
        oids: IndexSet::new(),
    };

    for device in devices {
        let node = NodePath::new(device.node_id);
        let Some(functions) = device.functions.as_deref() else {
            debug!(node = %node, "device has no functions, skipping");
            continue;
        };

        if let Some(function) = first_unlocked(functions, CLIMATE_FUNCTION_TYPE) {
            builder.climate(node, function);
        }
        if let Some(function) = first_unlocked(functions, HEATER_FUNCTION_TYPE) {
            builder.heater(node, function);
        }
    }

    info!(
        descriptors = builder.devices.len(),
        oids = builder.oids.len(),
        "discovery complete"
    );
    Registry {
        devices: Arc::new(builder.devices),
        oids: builder.oids,
    }
}

fn first_unlocked(functions: &[FunctionDescriptor], fct_type: i32) -> Option<&FunctionDescriptor> {
    functions
        .iter()
        .find(|f| f.fct_type == fct_type && !f.lock)
}

struct Builder<'a> {
    host: &'a str,
    devices: Vec<DeviceDescriptor>,
    oids: IndexSet<Oid>,
}

impl Builder<'_> {
    fn climate(&mut self, node: NodePath, function: &FunctionDescriptor) {
        let prefix = node.function(function.fct_id);
        debug!(prefix = %prefix, name = %function.name, "adopting climate function");

        self.oids
            .extend(CLIMATE_POLLED.iter().map(|address| prefix.point(*address)));

        let device_id = slug(self.host, &node.to_string());
        self.devices.push(DeviceDescriptor {
            id: device_id.clone(),
            name: function.name.clone(),
            device_id: device_id.clone(),
            device_name: function.name.clone(),
            kind: PointKind::Climate {
                prefix,
                oids: CLIMATE_DESCRIPTOR_POINTS
                    .iter()
                    .map(|address| prefix.relative(*address))
                    .collect(),
            },
        });

        for template in &CLIMATE_AUXILIARY {
            self.push_point(prefix, &device_id, &function.name, template);
        }
    }

    fn heater(&mut self, node: NodePath, function: &FunctionDescriptor) {
        let prefix = node.function(function.fct_id);
        debug!(prefix = %prefix, name = %function.name, "adopting heater function");

        let device_id = slug(self.host, &node.to_string());
        for template in &HEATER_POINTS {
            self.oids.insert(prefix.point(template.address));
            self.push_point(prefix, &device_id, &function.name, template);
        }
    }

    fn push_point(
        &mut self,
        prefix: FunctionPath,
        device_id: &str,
        function_name: &str,
        template: &PointTemplate,
    ) {
        let oid = prefix.point(template.address);
        let id = match template.id_suffix {
            Some(suffix) => slug(self.host, &format!("{oid}{suffix}")),
            None => slug(self.host, oid.as_str()),
        };

        let kind = match template.presentation {
            Presentation::Temperature { correction } => PointKind::Temperature {
                oid,
                correction_oid: correction.map(|c| prefix.point(c)),
            },
            Presentation::Sensor { unit, device_class } => PointKind::Sensor {
                oid,
                unit: Some(unit.to_owned()),
                device_class,
                state_class: None,
            },
            Presentation::Select(options) => PointKind::Select {
                oid,
                options: options.iter().map(|s| (*s).to_owned()).collect(),
            },
            Presentation::Total => PointKind::Total { oid },
            Presentation::TotalIncreasing => PointKind::TotalIncreasing { oid },
        };

        self.devices.push(DeviceDescriptor {
            id,
            name: format!("{function_name} {}", template.label),
            device_id: device_id.to_owned(),
            device_name: function_name.to_owned(),
            kind,
        });
    }
}
