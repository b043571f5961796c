// ── groundlink-core ──
//
// Reactive component publication for drone and remote control SDKs.
// Feature controllers own mutable component cores and commit immutable
// snapshots into per-device stores; observers hold `Ref` handles that are
// called back synchronously on every committed change.

pub mod component;
pub mod device;
pub mod instrument;
pub mod peripheral;
pub mod piloting_itf;
pub mod reference;
pub mod store;
pub mod stream;

// ── Primary re-exports ──

pub use component::{
    Component, ComponentCore, ComponentDescriptor, ComponentLifecycle, ComponentUid,
    Instrument, InstrumentUid, Instruments, Peripheral, PeripheralUid, Peripherals, PilotingItf,
    PilotingItfUid, PilotingItfs,
};
pub use device::{
    ConnectionState, ConnectionStateCause, DeviceConnector, DeviceConnectorTechnology,
    DeviceConnectorType, DeviceCore, DeviceCoreDelegate, DeviceHandle, DeviceModel, DeviceState,
    DeviceStateCore, DeviceStateHolderCore, Drone, DroneModel, NameHolderCore, RemoteControl,
    RemoteControlModel,
};
pub use reference::{Ref, RefClosed};
pub use store::{ComponentStoreCore, ListenerToken, ValueHolder};
pub use stream::RefStream;
