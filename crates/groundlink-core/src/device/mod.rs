// ── Devices ──
//
// Connectors, connection state, models and the device aggregate.

mod connector;
mod device_core;
mod facade;
mod model;
mod name;
mod state;

pub use connector::{DeviceConnector, DeviceConnectorTechnology, DeviceConnectorType};
pub use device_core::{DeviceCore, DeviceCoreDelegate, DeviceHandle};
pub use facade::{Drone, RemoteControl};
pub use model::{DeviceModel, DroneModel, RemoteControlModel, UnknownModel};
pub use name::NameHolderCore;
pub use state::{
    ConnectionState, ConnectionStateCause, DeviceState, DeviceStateCore, DeviceStateHolderCore,
};
