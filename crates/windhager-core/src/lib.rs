//! Polling core for Windhager heating appliances.
//!
//! Sits between `windhager-api` and consumers (the CLI, or any other
//! front end):
//!
//! - **[`Controller`]**: central facade. The first
//!   [`refresh()`](Controller::refresh) discovers the appliance's devices
//!   once, then every refresh reads all registered OIDs into a
//!   [`Snapshot`]. Writes go through [`Controller::write_oid`] or the
//!   typed [`ClimateCommand`]s.
//!
//! - **Discovery** ([`discovery`]): turns the root device list into
//!   [`DeviceDescriptor`]s and the set of [`Oid`]s to poll. Runs at most
//!   once per controller behind an explicit state machine.
//!
//! - **Domain model** ([`model`]): typed OID addressing, descriptors,
//!   decoded [`PointValue`]s and the interpreted [`PointState`] of a
//!   descriptor.
//!
//! - **Scanner** ([`scan`]): diagnostic walk of the full lookup tree.

pub mod climate;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod model;
pub mod poll;
pub mod scan;

// ── Primary re-exports ──────────────────────────────────────────────
pub use climate::{Bias, ClimateCommand, ClimateStatus, ClimateZone, HvacAction};
pub use config::{ControllerConfig, DEFAULT_USERNAME};
pub use controller::Controller;
pub use discovery::{DiscoveryPhase, Registry};
pub use error::CoreError;
pub use scan::ScanSummary;

pub use model::{
    DeviceClass, DeviceDescriptor, FunctionPath, NO_DATA, NodePath, Oid, OidError, PointAddress,
    PointKind, PointState, PointValue, Snapshot, StateClass,
};
