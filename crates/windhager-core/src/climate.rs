// ── Climate zones ──
//
// Read-side view of one heating zone over a snapshot, and the write
// sequences that change its setpoint, program and comfort bias.

use serde::Serialize;

use crate::discovery::catalog::{
    COMFORT_CORRECTION, CURRENT_TEMPERATURE, CUSTOM_DURATION, MODE, TARGET_TEMPERATURE,
    TARGET_TEMPERATURE_SETPOINT,
};
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, FunctionPath, Oid, PointAddress, PointValue, Snapshot};

/// Highest program number; shown while a manual setpoint is running.
pub const CUSTOM_PRESET: u8 = 7;

/// Remaining minutes written alongside a manual setpoint.
pub const CUSTOM_DURATION_MINUTES: &str = "400";

/// Accepted range of the comfort bias, in kelvin.
pub const COMPENSATION_RANGE: std::ops::RangeInclusive<f64> = -3.5..=3.5;

/// Whether readings are reported with the comfort bias removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    #[default]
    Compensated,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HvacAction {
    Off,
    Heating,
}

// ── View ────────────────────────────────────────────────────────────

/// A climate descriptor paired with a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ClimateZone<'a> {
    descriptor: &'a DeviceDescriptor,
    prefix: FunctionPath,
    snapshot: &'a Snapshot,
}

impl<'a> ClimateZone<'a> {
    /// `None` unless `descriptor` is a climate descriptor.
    pub fn new(descriptor: &'a DeviceDescriptor, snapshot: &'a Snapshot) -> Option<Self> {
        let prefix = descriptor.climate_prefix()?;
        Some(Self {
            descriptor,
            prefix,
            snapshot,
        })
    }

    /// Every climate zone in `snapshot`.
    pub fn all(snapshot: &'a Snapshot) -> impl Iterator<Item = ClimateZone<'a>> {
        snapshot
            .devices
            .iter()
            .filter_map(move |d| ClimateZone::new(d, snapshot))
    }

    pub fn descriptor(&self) -> &'a DeviceDescriptor {
        self.descriptor
    }

    pub fn prefix(&self) -> FunctionPath {
        self.prefix
    }

    fn number(&self, address: PointAddress) -> Option<f64> {
        self.snapshot.number(self.prefix.point(address).as_str())
    }

    fn biased(&self, address: PointAddress, bias: Bias) -> Option<f64> {
        let value = self.number(address)?;
        match bias {
            Bias::Raw => Some(value),
            Bias::Compensated => Some(value - self.number(COMFORT_CORRECTION)?),
        }
    }

    pub fn current_temperature(&self, bias: Bias) -> Option<f64> {
        self.biased(CURRENT_TEMPERATURE, bias)
    }

    pub fn target_temperature(&self, bias: Bias) -> Option<f64> {
        self.biased(TARGET_TEMPERATURE, bias)
    }

    pub fn comfort_compensation(&self) -> Option<f64> {
        self.number(COMFORT_CORRECTION)
    }

    /// Selected program, 0 when unknown.
    pub fn selected_mode(&self) -> u8 {
        self.snapshot
            .value(self.prefix.point(MODE).as_str())
            .and_then(PointValue::as_index)
            .and_then(|i| u8::try_from(i).ok())
            .unwrap_or(0)
    }

    /// Whether a manual setpoint is still running.
    pub fn custom_active(&self) -> bool {
        self.number(CUSTOM_DURATION).is_some_and(|m| m > 0.0)
    }

    /// The program to display: [`CUSTOM_PRESET`] while a manual setpoint
    /// runs, otherwise the selected mode.
    pub fn preset_mode(&self) -> u8 {
        if self.custom_active() {
            CUSTOM_PRESET
        } else {
            self.selected_mode()
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        if self.selected_mode() == 0 {
            HvacAction::Off
        } else {
            HvacAction::Heating
        }
    }

    pub fn status(&self) -> ClimateStatus {
        ClimateStatus {
            id: self.descriptor.id.clone(),
            name: self.descriptor.name.clone(),
            prefix: self.prefix,
            current_temperature: self.current_temperature(Bias::Compensated),
            current_temperature_raw: self.current_temperature(Bias::Raw),
            target_temperature: self.target_temperature(Bias::Compensated),
            target_temperature_raw: self.target_temperature(Bias::Raw),
            comfort_compensation: self.comfort_compensation(),
            preset_mode: self.preset_mode(),
            hvac_action: self.hvac_action(),
        }
    }
}

/// Owned summary of a zone, for display and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateStatus {
    pub id: String,
    pub name: String,
    pub prefix: FunctionPath,
    pub current_temperature: Option<f64>,
    pub current_temperature_raw: Option<f64>,
    pub target_temperature: Option<f64>,
    pub target_temperature_raw: Option<f64>,
    pub comfort_compensation: Option<f64>,
    pub preset_mode: u8,
    pub hvac_action: HvacAction,
}

// ── Commands ────────────────────────────────────────────────────────

/// A change to one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClimateCommand {
    /// Manual setpoint in °C, held for [`CUSTOM_DURATION_MINUTES`].
    SetTargetTemperature { celsius: f64 },
    /// Program 0..=7.
    SetPresetMode { mode: u8 },
    /// Comfort bias in kelvin, within [`COMPENSATION_RANGE`].
    SetComfortCompensation { kelvin: f64 },
}

impl ClimateCommand {
    pub fn validate(&self) -> Result<(), CoreError> {
        match *self {
            Self::SetTargetTemperature { celsius } if !celsius.is_finite() => {
                Err(CoreError::Validation {
                    field: "temperature".into(),
                    message: format!("{celsius} is not a temperature"),
                })
            }
            Self::SetPresetMode { mode } if mode > CUSTOM_PRESET => Err(CoreError::Validation {
                field: "preset".into(),
                message: format!("preset must be between 0 and {CUSTOM_PRESET}, got {mode}"),
            }),
            Self::SetComfortCompensation { kelvin } if !COMPENSATION_RANGE.contains(&kelvin) => {
                Err(CoreError::Validation {
                    field: "compensation".into(),
                    message: format!(
                        "compensation must be between {} and {} K, got {kelvin}",
                        COMPENSATION_RANGE.start(),
                        COMPENSATION_RANGE.end()
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// The datapoint writes this command expands to, in order.
    ///
    /// `custom_active` is whether the zone currently runs a manual
    /// setpoint, as seen in the latest snapshot.
    pub fn writes(&self, prefix: FunctionPath, custom_active: bool) -> Vec<(Oid, String)> {
        match *self {
            Self::SetTargetTemperature { celsius } => vec![
                (prefix.point(TARGET_TEMPERATURE_SETPOINT), celsius.to_string()),
                (
                    prefix.point(CUSTOM_DURATION),
                    CUSTOM_DURATION_MINUTES.to_owned(),
                ),
            ],
            Self::SetPresetMode { mode } => {
                let mut writes = vec![(prefix.point(MODE), mode.to_string())];
                if custom_active {
                    writes.push((prefix.point(CUSTOM_DURATION), "0".to_owned()));
                }
                writes
            }
            Self::SetComfortCompensation { kelvin } => {
                vec![(prefix.point(COMFORT_CORRECTION), kelvin.to_string())]
            }
        }
    }
}
