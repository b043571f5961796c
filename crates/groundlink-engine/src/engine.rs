// ── Engine ──
//
// Device registry and link event routing. Every known device has a
// `DeviceController` that owns its `DeviceCore`, its feature controllers
// and its settings dictionary. Link events coming from the transport drive
// the device state machine; feature messages fan out to the controllers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use groundlink_core::{
    ConnectionState, ConnectionStateCause, DeviceConnector, DeviceCore, DeviceCoreDelegate,
    DeviceHandle, DeviceModel,
};
use indexmap::IndexMap;
use indexmap::map::Entry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::{
    ComponentController, ControllerContext, drone_controllers, remote_control_controllers,
};
use crate::error::EngineError;
use crate::message::FeatureMessage;
use crate::settings::{DEVICE_MODEL_KEY, DEVICE_NAME_KEY, PersistentStore, SettingsStore};
use crate::transport::Transport;

const DEFAULT_AUTO_LANDING_CRITICAL_DELAY: Duration = Duration::from_secs(3);

// ── Configuration ────────────────────────────────────────────────────

/// Engine behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Keep persisted components (last GPS fix, piloting settings) published
    /// while a known device is disconnected.
    pub offline_settings: bool,
    /// A forced landing closer than this is a critical alarm; further away it
    /// is a warning.
    pub auto_landing_critical_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offline_settings: true,
            auto_landing_critical_delay: DEFAULT_AUTO_LANDING_CRITICAL_DELAY,
        }
    }
}

// ── Delegate ─────────────────────────────────────────────────────────

/// Work a device handle asks of the engine.
#[derive(Debug)]
enum EngineRequest {
    Forget { uid: String },
}

struct EngineDelegate {
    uid: String,
    transport: Arc<dyn Transport>,
    requests: mpsc::UnboundedSender<EngineRequest>,
}

impl DeviceCoreDelegate for EngineDelegate {
    fn forget(&self) -> bool {
        self.requests
            .send(EngineRequest::Forget {
                uid: self.uid.clone(),
            })
            .is_ok()
    }

    fn connect(&self, connector: &DeviceConnector, password: Option<&str>) -> bool {
        debug!(device = %self.uid, %connector, "connect requested");
        self.transport.connect(&self.uid, connector, password)
    }

    fn disconnect(&self) -> bool {
        debug!(device = %self.uid, "disconnect requested");
        self.transport.disconnect(&self.uid)
    }
}

// ── DeviceController ─────────────────────────────────────────────────

/// Engine side of one device.
pub struct DeviceController {
    device: DeviceCore,
    settings: SettingsStore,
    controllers: Vec<Box<dyn ComponentController>>,
}

impl DeviceController {
    fn new(
        device: DeviceCore,
        settings: SettingsStore,
        config: &EngineConfig,
        transport: &Arc<dyn Transport>,
    ) -> Self {
        let ctx = ControllerContext {
            device: &device,
            settings: &settings,
            config,
            transport,
        };
        let controllers = if device.model().is_drone() {
            drone_controllers(&ctx)
        } else {
            remote_control_controllers(&ctx)
        };
        Self {
            device,
            settings,
            controllers,
        }
    }

    pub fn device(&self) -> &DeviceHandle {
        self.device.handle()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.device.state_core().state().connection_state()
    }

    /// Adds `connector` if not known yet.
    fn add_connector(&mut self, connector: DeviceConnector) {
        let state = self.device.state_core().state();
        if state.connectors().contains(&connector) {
            return;
        }
        let mut connectors = state.connectors().to_vec();
        connectors.push(connector);
        self.device
            .state_core_mut()
            .update_connectors(connectors)
            .notify_updated();
    }

    fn remove_connector(&mut self, connector: &DeviceConnector) {
        let connectors: Vec<_> = self
            .device
            .state_core()
            .state()
            .connectors()
            .iter()
            .filter(|c| *c != connector)
            .cloned()
            .collect();
        self.device
            .state_core_mut()
            .update_connectors(connectors)
            .notify_updated();
    }

    /// Neither reachable nor remembered.
    fn is_disposable(&self) -> bool {
        let state = self.device.state_core();
        state.state().connectors().is_empty()
            && !state.is_persisted()
            && self.connection_state() == ConnectionState::Disconnected
    }

    pub fn link_connecting(&mut self, connector: DeviceConnector) {
        self.add_connector(connector.clone());
        self.device
            .state_core_mut()
            .update_active_connector(Some(connector))
            .update_connection_state_with_cause(
                ConnectionState::Connecting,
                ConnectionStateCause::None,
            )
            .notify_updated();
    }

    /// The link is up: the device becomes known, features publish, then the
    /// state turns connected.
    pub fn link_connected(&mut self) {
        self.settings
            .write(DEVICE_MODEL_KEY, &self.device.model())
            .write(
                DEVICE_NAME_KEY,
                self.device.name().as_deref().map_or("", String::as_str),
            )
            .commit();
        for controller in &mut self.controllers {
            controller.did_connect();
        }
        self.device
            .state_core_mut()
            .update_persisted(true)
            .update_connection_state_with_cause(
                ConnectionState::Connected,
                ConnectionStateCause::None,
            )
            .notify_updated();
    }

    pub fn link_disconnected(&mut self, cause: ConnectionStateCause) {
        for controller in &mut self.controllers {
            controller.did_disconnect();
        }
        self.device
            .state_core_mut()
            .update_active_connector(None)
            .update_connection_state_with_cause(ConnectionState::Disconnected, cause)
            .notify_updated();
    }

    pub fn did_receive(&mut self, message: &FeatureMessage) {
        if self.connection_state() != ConnectionState::Connected {
            debug!(device = %self.device.uid(), "message while not connected, dropped");
            return;
        }
        for controller in &mut self.controllers {
            controller.did_receive(message);
        }
    }

    /// Drops every persisted trace of the device.
    fn forget(&mut self) {
        for controller in &mut self.controllers {
            controller.will_forget();
        }
        self.settings.clear();
        self.device
            .state_core_mut()
            .update_persisted(false)
            .notify_updated();
    }
}

impl fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceController")
            .field("device", &self.device)
            .field("controllers", &self.controllers.len())
            .finish_non_exhaustive()
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Registry of known devices, fed with link events by the transport.
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    store: PersistentStore,
    devices: IndexMap<String, DeviceController>,
    requests_tx: mpsc::UnboundedSender<EngineRequest>,
    requests_rx: mpsc::UnboundedReceiver<EngineRequest>,
}

impl Engine {
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>, store: PersistentStore) -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport,
            store,
            devices: IndexMap::new(),
            requests_tx,
            requests_rx,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Restores every device remembered in the settings store.
    pub fn start(&mut self) {
        for uid in self.store.device_uids() {
            if self.devices.contains_key(&uid) {
                continue;
            }
            let settings = self.store.device(&uid);
            let Some(model) = settings.read::<DeviceModel>(DEVICE_MODEL_KEY) else {
                warn!(device = %uid, "stored device has no usable model, skipped");
                continue;
            };
            let name = settings
                .read::<String>(DEVICE_NAME_KEY)
                .unwrap_or_else(|| uid.clone());
            let mut controller = self.create_controller(&uid, model, &name);
            controller
                .device
                .state_core_mut()
                .update_persisted(true)
                .notify_updated();
            info!(device = %uid, %model, "restored known device");
            self.devices.insert(uid, controller);
        }
    }

    fn create_controller(&self, uid: &str, model: DeviceModel, name: &str) -> DeviceController {
        new_device_controller(
            uid,
            model,
            name,
            &self.config,
            &self.transport,
            &self.store,
            &self.requests_tx,
        )
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// A device became reachable through `connector`. Creates it on first
    /// sight; otherwise refreshes its name and connector list.
    pub fn device_discovered(
        &mut self,
        uid: &str,
        model: DeviceModel,
        name: &str,
        connector: DeviceConnector,
    ) -> DeviceHandle {
        let controller = match self.devices.entry(uid.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                info!(device = %uid, %model, %connector, "discovered device");
                entry.insert(new_device_controller(
                    uid,
                    model,
                    name,
                    &self.config,
                    &self.transport,
                    &self.store,
                    &self.requests_tx,
                ))
            }
        };
        if controller.device.model() != model {
            warn!(
                device = %uid,
                known = %controller.device.model(),
                reported = %model,
                "discovery reports a different model, keeping the known one"
            );
        }
        if controller.device.name_holder().update(name) {
            debug!(device = %uid, name, "device renamed");
        }
        controller.add_connector(connector);
        controller.device().clone()
    }

    /// `connector` no longer reaches the device.
    pub fn device_lost(&mut self, uid: &str, connector: &DeviceConnector) -> Result<(), EngineError> {
        self.controller_mut(uid)?.remove_connector(connector);
        self.dispose_if_unused(uid);
        Ok(())
    }

    // ── Link events ──────────────────────────────────────────────────

    pub fn link_connecting(
        &mut self,
        uid: &str,
        connector: DeviceConnector,
    ) -> Result<(), EngineError> {
        self.controller_mut(uid)?.link_connecting(connector);
        Ok(())
    }

    pub fn link_connected(&mut self, uid: &str) -> Result<(), EngineError> {
        self.controller_mut(uid)?.link_connected();
        info!(device = %uid, "device connected");
        Ok(())
    }

    pub fn link_disconnected(
        &mut self,
        uid: &str,
        cause: ConnectionStateCause,
    ) -> Result<(), EngineError> {
        self.controller_mut(uid)?.link_disconnected(cause);
        info!(device = %uid, %cause, "device disconnected");
        self.dispose_if_unused(uid);
        Ok(())
    }

    pub fn message(&mut self, uid: &str, message: &FeatureMessage) -> Result<(), EngineError> {
        self.controller_mut(uid)?.did_receive(message);
        Ok(())
    }

    // ── Forget ───────────────────────────────────────────────────────

    /// Disconnects the device if needed and erases its persisted data. The
    /// device stays listed while some connector still reaches it.
    pub fn forget(&mut self, uid: &str) -> Result<(), EngineError> {
        let transport = Arc::clone(&self.transport);
        let controller = self.controller_mut(uid)?;
        if controller.connection_state() != ConnectionState::Disconnected {
            transport.disconnect(uid);
            controller.link_disconnected(ConnectionStateCause::UserRequest);
        }
        controller.forget();
        info!(device = %uid, "device forgotten");
        self.dispose_if_unused(uid);
        Ok(())
    }

    /// Runs work queued by device handles. Returns how many requests ran.
    pub fn process_requests(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(request) = self.requests_rx.try_recv() {
            processed += 1;
            match request {
                EngineRequest::Forget { uid } => {
                    if let Err(e) = self.forget(&uid) {
                        warn!(error = %e, "forget request failed");
                    }
                }
            }
        }
        processed
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn device(&self, uid: &str) -> Option<DeviceHandle> {
        self.devices.get(uid).map(|c| c.device().clone())
    }

    /// Known devices in discovery order.
    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.devices.values().map(|c| c.device().clone()).collect()
    }

    fn controller_mut(&mut self, uid: &str) -> Result<&mut DeviceController, EngineError> {
        self.devices
            .get_mut(uid)
            .ok_or_else(|| EngineError::DeviceNotFound {
                uid: uid.to_owned(),
            })
    }

    fn dispose_if_unused(&mut self, uid: &str) {
        if !self.devices.get(uid).is_some_and(DeviceController::is_disposable) {
            return;
        }
        if let Some(controller) = self.devices.shift_remove(uid) {
            controller.device.clear();
            info!(device = %uid, "device removed");
        }
    }
}

fn new_device_controller(
    uid: &str,
    model: DeviceModel,
    name: &str,
    config: &EngineConfig,
    transport: &Arc<dyn Transport>,
    store: &PersistentStore,
    requests: &mpsc::UnboundedSender<EngineRequest>,
) -> DeviceController {
    let delegate = Arc::new(EngineDelegate {
        uid: uid.to_owned(),
        transport: Arc::clone(transport),
        requests: requests.clone(),
    });
    DeviceController::new(
        DeviceCore::new(uid, model, name, delegate),
        store.device(uid),
        config,
        transport,
    )
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("devices", &self.devices.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
