// ── Application facades ──
//
// Typed, cloneable views handed to applications. Remote controls have no
// piloting interfaces, so their facade does not expose that store.

use std::sync::Arc;

use super::connector::DeviceConnector;
use super::device_core::DeviceHandle;
use super::model::{DroneModel, RemoteControlModel};
use super::state::DeviceState;
use crate::component::{ComponentDescriptor, Instrument, Peripheral, PilotingItf};
use crate::reference::Ref;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drone {
    handle: DeviceHandle,
    model: DroneModel,
}

impl Drone {
    pub(crate) fn new(handle: DeviceHandle, model: DroneModel) -> Self {
        Self { handle, model }
    }

    pub fn uid(&self) -> &str {
        self.handle.uid()
    }

    pub fn model(&self) -> DroneModel {
        self.model
    }

    pub fn name(&self) -> Option<Arc<String>> {
        self.handle.name()
    }

    pub fn observe_name(
        &self,
        observer: impl Fn(Option<Arc<String>>) + Send + Sync + 'static,
    ) -> Ref<String> {
        self.handle.observe_name(observer)
    }

    pub fn state(&self) -> Option<Arc<DeviceState>> {
        self.handle.state()
    }

    pub fn observe_state(
        &self,
        observer: impl Fn(Option<Arc<DeviceState>>) + Send + Sync + 'static,
    ) -> Ref<DeviceState> {
        self.handle.observe_state(observer)
    }

    pub fn instrument<T: Instrument>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.handle.instrument(descriptor)
    }

    pub fn observe_instrument<T: Instrument>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.handle.observe_instrument(descriptor, observer)
    }

    pub fn peripheral<T: Peripheral>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.handle.peripheral(descriptor)
    }

    pub fn observe_peripheral<T: Peripheral>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.handle.observe_peripheral(descriptor, observer)
    }

    pub fn piloting_itf<T: PilotingItf>(
        &self,
        descriptor: ComponentDescriptor<T>,
    ) -> Option<Arc<T>> {
        self.handle.piloting_itf(descriptor)
    }

    pub fn observe_piloting_itf<T: PilotingItf>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.handle.observe_piloting_itf(descriptor, observer)
    }

    pub fn forget(&self) -> bool {
        self.handle.forget()
    }

    pub fn connect(&self, connector: Option<&DeviceConnector>, password: Option<&str>) -> bool {
        self.handle.connect(connector, password)
    }

    pub fn disconnect(&self) -> bool {
        self.handle.disconnect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteControl {
    handle: DeviceHandle,
    model: RemoteControlModel,
}

impl RemoteControl {
    pub(crate) fn new(handle: DeviceHandle, model: RemoteControlModel) -> Self {
        Self { handle, model }
    }

    pub fn uid(&self) -> &str {
        self.handle.uid()
    }

    pub fn model(&self) -> RemoteControlModel {
        self.model
    }

    pub fn name(&self) -> Option<Arc<String>> {
        self.handle.name()
    }

    pub fn observe_name(
        &self,
        observer: impl Fn(Option<Arc<String>>) + Send + Sync + 'static,
    ) -> Ref<String> {
        self.handle.observe_name(observer)
    }

    pub fn state(&self) -> Option<Arc<DeviceState>> {
        self.handle.state()
    }

    pub fn observe_state(
        &self,
        observer: impl Fn(Option<Arc<DeviceState>>) + Send + Sync + 'static,
    ) -> Ref<DeviceState> {
        self.handle.observe_state(observer)
    }

    pub fn instrument<T: Instrument>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.handle.instrument(descriptor)
    }

    pub fn observe_instrument<T: Instrument>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.handle.observe_instrument(descriptor, observer)
    }

    pub fn peripheral<T: Peripheral>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.handle.peripheral(descriptor)
    }

    pub fn observe_peripheral<T: Peripheral>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.handle.observe_peripheral(descriptor, observer)
    }

    pub fn forget(&self) -> bool {
        self.handle.forget()
    }

    pub fn connect(&self, connector: Option<&DeviceConnector>, password: Option<&str>) -> bool {
        self.handle.connect(connector, password)
    }

    pub fn disconnect(&self) -> bool {
        self.handle.disconnect()
    }
}
