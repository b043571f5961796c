//! Device engine on top of `groundlink-core`.
//!
//! - **[`Engine`]**: registry of known devices. Receives discovery and
//!   link events from a [`Transport`], creates one [`DeviceController`] per
//!   device and removes devices that are neither reachable nor remembered.
//!
//! - **Feature controllers** ([`controller`]): own the component cores of a
//!   device and turn decoded [`FeatureMessage`]s into batched updates.
//!
//! - **[`PersistentStore`] / [`SettingsStore`]**: one JSON document with a
//!   dictionary per known device, used for the device list, the last GPS
//!   fix and piloting settings.

pub mod controller;
pub mod engine;
pub mod error;
pub mod message;
pub mod settings;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::ComponentController;
pub use engine::{DeviceController, Engine, EngineConfig};
pub use error::EngineError;
pub use message::FeatureMessage;
pub use settings::{PersistentStore, SettingsStore};
pub use transport::{DeviceCommand, Transport};
