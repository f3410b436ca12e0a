// ── Point catalog ──
//
// The fixed set of points discovery registers for each supported
// function type, and how each one is presented.

use crate::model::{DeviceClass, PointAddress};

/// Function type of a heating zone (thermostat).
pub const CLIMATE_FUNCTION_TYPE: i32 = 14;

/// Function type of a pellet boiler.
pub const HEATER_FUNCTION_TYPE: i32 = 9;

// ── Climate points ──────────────────────────────────────────────────

pub const CURRENT_TEMPERATURE: PointAddress = PointAddress::new(0, 1, 0);
pub const TARGET_TEMPERATURE: PointAddress = PointAddress::new(1, 1, 0);
/// Selected operating program, 0..=6.
pub const MODE: PointAddress = PointAddress::new(3, 50, 0);
/// Remaining duration of a manual setpoint, in minutes.
pub const CUSTOM_DURATION: PointAddress = PointAddress::new(2, 10, 0);
pub const OUTSIDE_TEMPERATURE: PointAddress = PointAddress::new(0, 0, 0);
/// Comfort bias, in kelvin, applied on top of the room setpoint.
pub const COMFORT_CORRECTION: PointAddress = PointAddress::new(3, 58, 0);
pub const TEMPERATURE_CORRECTION: PointAddress = PointAddress::new(3, 7, 0);
/// Write-only: manual room setpoint.
pub const TARGET_TEMPERATURE_SETPOINT: PointAddress = PointAddress::new(3, 4, 0);

/// Every climate point polled, in registration order.
pub const CLIMATE_POLLED: [PointAddress; 7] = [
    CURRENT_TEMPERATURE,
    TARGET_TEMPERATURE,
    MODE,
    CUSTOM_DURATION,
    OUTSIDE_TEMPERATURE,
    COMFORT_CORRECTION,
    TEMPERATURE_CORRECTION,
];

/// The points a climate descriptor lists in its `oids`.
pub const CLIMATE_DESCRIPTOR_POINTS: [PointAddress; 5] = [
    CURRENT_TEMPERATURE,
    TARGET_TEMPERATURE,
    MODE,
    CUSTOM_DURATION,
    COMFORT_CORRECTION,
];

// ── Heater points ───────────────────────────────────────────────────

pub const POWER: PointAddress = PointAddress::new(0, 9, 0);
pub const FUMES_TEMPERATURE: PointAddress = PointAddress::new(0, 11, 0);
pub const HEATER_TEMPERATURE: PointAddress = PointAddress::new(0, 7, 0);
pub const COMBUSTION_CHAMBER_TEMPERATURE: PointAddress = PointAddress::new(0, 45, 0);
pub const HEATER_STATUS: PointAddress = PointAddress::new(2, 1, 0);
pub const PELLET_CONSUMPTION: PointAddress = PointAddress::new(23, 100, 0);
pub const PELLET_CONSUMPTION_TOTAL: PointAddress = PointAddress::new(23, 103, 0);
pub const CLEANING_STAGE_1: PointAddress = PointAddress::new(20, 61, 0);
pub const CLEANING_STAGE_2: PointAddress = PointAddress::new(20, 62, 0);

/// Heater status labels, indexed by the raw value of [`HEATER_STATUS`].
pub const HEATER_STATUS_LABELS: [&str; 16] = [
    "Brûleur bloqué",
    "Autotest",
    "Eteindre gén. chaleur",
    "Veille",
    "Brûleur ARRET",
    "Prérinçage",
    "Phase d'allumage",
    "Stabilisation flamme",
    "Mode modulant",
    "Chaudière bloqué",
    "Veille temps différé",
    "Ventilateur Arrêté",
    "Porte de revêtement ouverte",
    "Allumage prêt",
    "Annuler phase d'allumage",
    "Préchauffage en cours",
];

// ── Templates ───────────────────────────────────────────────────────

/// How a catalogued point becomes a descriptor.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Presentation {
    Temperature {
        correction: Option<PointAddress>,
    },
    Sensor {
        unit: &'static str,
        device_class: Option<DeviceClass>,
    },
    Select(&'static [&'static str]),
    Total,
    TotalIncreasing,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PointTemplate {
    pub address: PointAddress,
    /// Appended to the function name.
    pub label: &'static str,
    /// Extra path mixed into the id when two descriptors share a point.
    pub id_suffix: Option<PointAddress>,
    pub presentation: Presentation,
}

const fn template(
    address: PointAddress,
    label: &'static str,
    presentation: Presentation,
) -> PointTemplate {
    PointTemplate {
        address,
        label,
        id_suffix: None,
        presentation,
    }
}

const KELVIN: Presentation = Presentation::Sensor {
    unit: "K",
    device_class: None,
};

const HOURS: Presentation = Presentation::Sensor {
    unit: "h",
    device_class: Some(DeviceClass::Duration),
};

const PLAIN_TEMPERATURE: Presentation = Presentation::Temperature { correction: None };

const COMFORT_ADJUSTED: Presentation = Presentation::Temperature {
    correction: Some(COMFORT_CORRECTION),
};

/// Descriptors emitted next to each climate descriptor.
pub(crate) const CLIMATE_AUXILIARY: [PointTemplate; 6] = [
    PointTemplate {
        address: CURRENT_TEMPERATURE,
        label: "Current Temperature",
        id_suffix: Some(COMFORT_CORRECTION),
        presentation: COMFORT_ADJUSTED,
    },
    template(CURRENT_TEMPERATURE, "Current Temperature real", PLAIN_TEMPERATURE),
    template(COMFORT_CORRECTION, "Comfort Temperature Correction", KELVIN),
    template(TEMPERATURE_CORRECTION, "Current Temperature Correction", KELVIN),
    template(TARGET_TEMPERATURE, "Target Temperature", COMFORT_ADJUSTED),
    template(OUTSIDE_TEMPERATURE, "Outside Temperature", PLAIN_TEMPERATURE),
];

/// Heater descriptors; their addresses are also the polled heater points.
pub(crate) const HEATER_POINTS: [PointTemplate; 9] = [
    template(
        POWER,
        "Power factor",
        Presentation::Sensor {
            unit: "%",
            device_class: Some(DeviceClass::PowerFactor),
        },
    ),
    template(FUMES_TEMPERATURE, "Fumes Temperature", PLAIN_TEMPERATURE),
    template(HEATER_TEMPERATURE, "Heater Temperature", PLAIN_TEMPERATURE),
    template(
        COMBUSTION_CHAMBER_TEMPERATURE,
        "Combustion chamber Temperature",
        PLAIN_TEMPERATURE,
    ),
    template(
        HEATER_STATUS,
        "Heater status",
        Presentation::Select(&HEATER_STATUS_LABELS),
    ),
    template(PELLET_CONSUMPTION, "Pellet consumption", Presentation::Total),
    template(
        PELLET_CONSUMPTION_TOTAL,
        "Total Pellet consumption",
        Presentation::TotalIncreasing,
    ),
    template(CLEANING_STAGE_1, "Running time until stage 1 cleaning", HOURS),
    template(CLEANING_STAGE_2, "Running time until stage 2 cleaning", HOURS),
];
