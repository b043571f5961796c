// ── Device aggregate ──
//
// `DeviceCore` is owned by the engine side of a device. It holds the
// mutable connection state machine and a cloneable `DeviceHandle` with the
// name and state holders, the three component stores and the transport
// delegate. Application facades (`Drone`, `RemoteControl`) wrap the handle.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tracing::debug;

use super::connector::DeviceConnector;
use super::facade::{Drone, RemoteControl};
use super::model::DeviceModel;
use super::name::NameHolderCore;
use super::state::{DeviceState, DeviceStateCore, DeviceStateHolderCore};
use crate::component::{
    Component, ComponentDescriptor, ComponentUid, Instrument, Peripheral, PilotingItf,
};
use crate::reference::Ref;
use crate::store::ComponentStoreCore;

/// Transport-side actions a device delegates.
pub trait DeviceCoreDelegate: Send + Sync {
    fn forget(&self) -> bool;

    fn connect(&self, connector: &DeviceConnector, password: Option<&str>) -> bool;

    fn disconnect(&self) -> bool;
}

struct DeviceShared {
    uid: String,
    model: DeviceModel,
    name: NameHolderCore,
    state: DeviceStateHolderCore,
    instruments: ComponentStoreCore,
    peripherals: ComponentStoreCore,
    piloting_itfs: ComponentStoreCore,
    delegate: Arc<dyn DeviceCoreDelegate>,
}

/// Shared read, observe and action surface of a device.
#[derive(Clone)]
pub struct DeviceHandle {
    shared: Arc<DeviceShared>,
}

impl DeviceHandle {
    pub fn uid(&self) -> &str {
        &self.shared.uid
    }

    pub fn model(&self) -> DeviceModel {
        self.shared.model
    }

    pub fn name_holder(&self) -> &NameHolderCore {
        &self.shared.name
    }

    pub fn state_holder(&self) -> &DeviceStateHolderCore {
        &self.shared.state
    }

    pub fn instrument_store(&self) -> &ComponentStoreCore {
        &self.shared.instruments
    }

    pub fn peripheral_store(&self) -> &ComponentStoreCore {
        &self.shared.peripherals
    }

    pub fn piloting_itf_store(&self) -> &ComponentStoreCore {
        &self.shared.piloting_itfs
    }

    // ── Name & state ──

    pub fn name(&self) -> Option<Arc<String>> {
        self.shared.name.name()
    }

    pub fn observe_name(
        &self,
        observer: impl Fn(Option<Arc<String>>) + Send + Sync + 'static,
    ) -> Ref<String> {
        self.shared.name.observe(observer)
    }

    pub fn state(&self) -> Option<Arc<DeviceState>> {
        self.shared.state.state()
    }

    pub fn observe_state(
        &self,
        observer: impl Fn(Option<Arc<DeviceState>>) + Send + Sync + 'static,
    ) -> Ref<DeviceState> {
        self.shared.state.observe(observer)
    }

    // ── Components ──

    pub fn instrument<T: Instrument>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.shared.instruments.get(descriptor)
    }

    pub fn observe_instrument<T: Instrument>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.shared.instruments.observe(descriptor, observer)
    }

    pub fn instrument_by_uid(&self, uid: impl Into<ComponentUid>) -> Option<Arc<dyn Component>> {
        self.shared.instruments.get_by_uid(uid)
    }

    pub fn observe_instrument_uid(
        &self,
        uid: impl Into<ComponentUid>,
        observer: impl Fn(Option<Arc<dyn Component>>) + Send + Sync + 'static,
    ) -> Ref<dyn Component> {
        self.shared.instruments.observe_uid(uid, observer)
    }

    pub fn peripheral<T: Peripheral>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        self.shared.peripherals.get(descriptor)
    }

    pub fn observe_peripheral<T: Peripheral>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.shared.peripherals.observe(descriptor, observer)
    }

    pub fn peripheral_by_uid(&self, uid: impl Into<ComponentUid>) -> Option<Arc<dyn Component>> {
        self.shared.peripherals.get_by_uid(uid)
    }

    pub fn observe_peripheral_uid(
        &self,
        uid: impl Into<ComponentUid>,
        observer: impl Fn(Option<Arc<dyn Component>>) + Send + Sync + 'static,
    ) -> Ref<dyn Component> {
        self.shared.peripherals.observe_uid(uid, observer)
    }

    pub fn piloting_itf<T: PilotingItf>(
        &self,
        descriptor: ComponentDescriptor<T>,
    ) -> Option<Arc<T>> {
        self.shared.piloting_itfs.get(descriptor)
    }

    pub fn observe_piloting_itf<T: PilotingItf>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        self.shared.piloting_itfs.observe(descriptor, observer)
    }

    pub fn piloting_itf_by_uid(
        &self,
        uid: impl Into<ComponentUid>,
    ) -> Option<Arc<dyn Component>> {
        self.shared.piloting_itfs.get_by_uid(uid)
    }

    pub fn observe_piloting_itf_uid(
        &self,
        uid: impl Into<ComponentUid>,
        observer: impl Fn(Option<Arc<dyn Component>>) + Send + Sync + 'static,
    ) -> Ref<dyn Component> {
        self.shared.piloting_itfs.observe_uid(uid, observer)
    }

    // ── Actions ──

    pub fn forget(&self) -> bool {
        debug!(device = %self.shared.uid, "forget requested");
        self.shared.delegate.forget()
    }

    /// Connects through `connector`, or through the unambiguous best
    /// connector when `None`. Returns `false` if no connector resolves.
    pub fn connect(&self, connector: Option<&DeviceConnector>, password: Option<&str>) -> bool {
        let state = self.state();
        let Some(connector) =
            connector.or_else(|| state.as_deref().and_then(DeviceState::best_connector))
        else {
            debug!(device = %self.shared.uid, "no unambiguous connector, connect refused");
            return false;
        };
        debug!(device = %self.shared.uid, %connector, "connect requested");
        self.shared.delegate.connect(connector, password)
    }

    pub fn disconnect(&self) -> bool {
        debug!(device = %self.shared.uid, "disconnect requested");
        self.shared.delegate.disconnect()
    }

    /// Typed facade if this device is a drone.
    pub fn as_drone(&self) -> Option<Drone> {
        match self.shared.model {
            DeviceModel::Drone(model) => Some(Drone::new(self.clone(), model)),
            DeviceModel::RemoteControl(_) => None,
        }
    }

    /// Typed facade if this device is a remote control.
    pub fn as_remote_control(&self) -> Option<RemoteControl> {
        match self.shared.model {
            DeviceModel::RemoteControl(model) => Some(RemoteControl::new(self.clone(), model)),
            DeviceModel::Drone(_) => None,
        }
    }
}

impl PartialEq for DeviceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.shared.uid == other.shared.uid
    }
}

impl Eq for DeviceHandle {}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("uid", &self.shared.uid)
            .field("model", &self.shared.model)
            .finish_non_exhaustive()
    }
}

/// Engine-side device: the shared handle plus the mutable state machine.
///
/// Dereferences to [`DeviceHandle`] for the read, observe and action API.
pub struct DeviceCore {
    handle: DeviceHandle,
    state: DeviceStateCore,
}

impl DeviceCore {
    pub fn new(
        uid: impl Into<String>,
        model: DeviceModel,
        name: impl Into<String>,
        delegate: Arc<dyn DeviceCoreDelegate>,
    ) -> Self {
        let state_holder = DeviceStateHolderCore::new();
        let state = DeviceStateCore::new(state_holder.clone());
        Self {
            handle: DeviceHandle {
                shared: Arc::new(DeviceShared {
                    uid: uid.into(),
                    model,
                    name: NameHolderCore::new(name),
                    state: state_holder,
                    instruments: ComponentStoreCore::new(),
                    peripherals: ComponentStoreCore::new(),
                    piloting_itfs: ComponentStoreCore::new(),
                    delegate,
                }),
            },
            state,
        }
    }

    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Connection state machine, including uncommitted changes.
    pub fn state_core(&self) -> &DeviceStateCore {
        &self.state
    }

    pub fn state_core_mut(&mut self) -> &mut DeviceStateCore {
        &mut self.state
    }

    /// Tears down holders and stores without notifying anyone.
    pub fn clear(&self) {
        let shared = &self.handle.shared;
        shared.name.clear();
        shared.state.clear();
        shared.instruments.clear();
        shared.peripherals.clear();
        shared.piloting_itfs.clear();
    }
}

impl Deref for DeviceCore {
    type Target = DeviceHandle;

    fn deref(&self) -> &DeviceHandle {
        &self.handle
    }
}

impl fmt::Debug for DeviceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCore")
            .field("uid", &self.handle.shared.uid)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::component::{ComponentLifecycle, Instruments};
    use crate::device::connector::DeviceConnectorTechnology;
    use crate::device::model::{DroneModel, RemoteControlModel};
    use crate::instrument::{AlarmKind, AlarmsCore};

    #[derive(Default)]
    struct RecordingDelegate {
        connects: Mutex<Vec<(String, Option<String>)>>,
        forgets: AtomicUsize,
    }

    impl DeviceCoreDelegate for RecordingDelegate {
        fn forget(&self) -> bool {
            self.forgets.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn connect(&self, connector: &DeviceConnector, password: Option<&str>) -> bool {
            self.connects
                .lock()
                .push((connector.to_string(), password.map(str::to_owned)));
            true
        }

        fn disconnect(&self) -> bool {
            false
        }
    }

    fn drone() -> (Arc<RecordingDelegate>, DeviceCore) {
        let delegate = Arc::new(RecordingDelegate::default());
        let core = DeviceCore::new(
            "PI040001",
            DeviceModel::Drone(DroneModel::Anafi4k),
            "ANAFI-001",
            delegate.clone(),
        );
        (delegate, core)
    }

    #[test]
    fn connect_without_connector_uses_best_connector() {
        let (delegate, mut core) = drone();
        core.state_core_mut()
            .update_connectors(vec![
                DeviceConnector::local(DeviceConnectorTechnology::Wifi),
                DeviceConnector::local(DeviceConnectorTechnology::Usb),
            ])
            .notify_updated();

        assert!(core.connect(None, Some("secret")));
        assert_eq!(
            *delegate.connects.lock(),
            vec![(String::from("local-usb"), Some(String::from("secret")))]
        );
    }

    #[test]
    fn connect_fails_when_best_connector_ambiguous() {
        let (delegate, mut core) = drone();
        core.state_core_mut()
            .update_connectors(vec![
                DeviceConnector::remote_control("rc-a"),
                DeviceConnector::remote_control("rc-b"),
            ])
            .notify_updated();

        assert!(!core.connect(None, None));
        assert!(core.connect(Some(&DeviceConnector::remote_control("rc-b")), None));
        assert_eq!(delegate.connects.lock().len(), 1);
    }

    #[test]
    fn forget_and_disconnect_go_to_delegate() {
        let (delegate, core) = drone();
        assert!(core.forget());
        assert!(!core.disconnect());
        assert_eq!(delegate.forgets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_empties_everything_silently() {
        let (_delegate, core) = drone();
        let mut alarms = AlarmsCore::new(core.instrument_store(), &[AlarmKind::Power]);
        alarms.publish();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let _reference = core.observe_instrument(Instruments::ALARMS, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        core.clear();

        assert!(core.instrument(Instruments::ALARMS).is_none());
        assert!(core.name().is_none());
        assert!(core.state().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn references_read_absent_once_device_is_gone() {
        let (_delegate, core) = drone();
        let mut alarms = AlarmsCore::new(core.instrument_store(), &[AlarmKind::Power]);
        alarms.publish();
        let instrument = core.observe_instrument(Instruments::ALARMS, |_| {});
        let state = core.observe_state(|_| {});
        let name = core.observe_name(|_| {});
        assert!(instrument.value().is_some());
        assert!(state.value().is_some());

        core.clear();

        assert!(instrument.value().is_none());
        assert!(state.value().is_none());
        assert!(name.value().is_none());
    }

    #[test]
    fn references_outliving_device_read_absent() {
        let (_delegate, core) = drone();
        let mut alarms = AlarmsCore::new(core.instrument_store(), &[]);
        alarms.publish();
        let instrument = core.observe_instrument_uid(Instruments::ALARMS.uid(), |_| {});
        let state = core.observe_state(|_| {});

        drop(alarms);
        drop(core);

        assert!(instrument.value().is_none());
        assert!(state.value().is_none());
    }

    #[test]
    fn facades_match_model() {
        let (_delegate, core) = drone();
        assert!(core.as_drone().is_some());
        assert!(core.as_remote_control().is_none());

        let rc = DeviceCore::new(
            "RC1",
            DeviceModel::RemoteControl(RemoteControlModel::SkyCtrl3),
            "SkyController 3",
            Arc::new(RecordingDelegate::default()),
        );
        assert_eq!(
            rc.as_remote_control().unwrap().model(),
            RemoteControlModel::SkyCtrl3
        );
    }

    #[test]
    fn uid_observer_sees_published_instrument() {
        let (_delegate, core) = drone();
        let reference = core.observe_instrument_uid(Instruments::ALARMS.uid(), |_| {});
        let mut alarms = AlarmsCore::new(core.instrument_store(), &[]);
        alarms.publish();

        assert_eq!(reference.value().unwrap().uid(), Instruments::ALARMS.uid());
    }
}
