// ── Domain model ──
//
// Addressing, discovered descriptors, decoded values and poll snapshots.

pub mod descriptor;
pub mod oid;
pub mod snapshot;
pub mod state;
pub mod value;

pub use descriptor::{DeviceClass, DeviceDescriptor, PointKind, StateClass};
pub use oid::{FunctionPath, NodePath, Oid, OidError, PointAddress, slug};
pub use snapshot::Snapshot;
pub use state::{PELLET_UNIT, PointState};
pub use value::{NO_DATA, PointValue};
