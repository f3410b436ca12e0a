// windhager-api: Async Rust client for the Windhager lookup API (HTTP Digest auth)

pub mod client;
pub mod digest;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{ROOT_PATH, WindhagerClient};
pub use digest::{DigestAlgorithm, DigestAuth, DigestChallenge};
pub use error::Error;
pub use models::{FunctionDescriptor, NodeDevice, SensorGroup};
pub use transport::TransportConfig;
