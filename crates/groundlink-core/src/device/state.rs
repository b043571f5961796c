// ── Device connection state ──
//
// `DeviceStateCore` is the mutable connection state machine driven by the
// engine. Each committed batch is published as a `DeviceState` snapshot in
// the device's `DeviceStateHolderCore`. The three availability flags are
// recomputed from the other fields after every mutation and never set
// directly.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::connector::{DeviceConnector, DeviceConnectorTechnology, DeviceConnectorType};
use crate::reference::Ref;
use crate::store::ValueHolder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionStateCause {
    #[default]
    None,
    UserRequest,
    ConnectionLost,
    Refused,
    BadPassword,
    Failure,
}

/// Published device state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    connection_state: ConnectionState,
    connection_state_cause: ConnectionStateCause,
    connectors: Vec<DeviceConnector>,
    active_connector: Option<DeviceConnector>,
    can_be_forgotten: bool,
    can_be_connected: bool,
    can_be_disconnected: bool,
}

impl DeviceState {
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn connection_state_cause(&self) -> ConnectionStateCause {
        self.connection_state_cause
    }

    pub fn connectors(&self) -> &[DeviceConnector] {
        &self.connectors
    }

    pub fn active_connector(&self) -> Option<&DeviceConnector> {
        self.active_connector.as_ref()
    }

    pub fn can_be_forgotten(&self) -> bool {
        self.can_be_forgotten
    }

    pub fn can_be_connected(&self) -> bool {
        self.can_be_connected
    }

    pub fn can_be_disconnected(&self) -> bool {
        self.can_be_disconnected
    }

    /// The connector to use when none is given, if the choice is
    /// unambiguous: the only connector, else the only remote control
    /// connector, else (with no remote control connector) the only local
    /// usb connector.
    pub fn best_connector(&self) -> Option<&DeviceConnector> {
        if let [only] = self.connectors.as_slice() {
            return Some(only);
        }

        let mut remote = self
            .connectors
            .iter()
            .filter(|c| c.connector_type() == DeviceConnectorType::RemoteControl);
        match (remote.next(), remote.next()) {
            (Some(only), None) => Some(only),
            (None, _) => {
                let mut usb = self.connectors.iter().filter(|c| {
                    c.connector_type() == DeviceConnectorType::Local
                        && c.technology() == DeviceConnectorTechnology::Usb
                });
                match (usb.next(), usb.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            }
            (Some(_), Some(_)) => None,
        }
    }

    /// Highest ranked connector. Ties keep list order.
    pub fn one_of_the_best_connector(&self) -> Option<&DeviceConnector> {
        self.connectors
            .iter()
            .reduce(|best, c| if c.better_than(best) { c } else { best })
    }

    fn recompute(&mut self, persisted: bool) {
        self.can_be_forgotten = persisted
            || self
                .connectors
                .iter()
                .any(|c| c.connector_type() == DeviceConnectorType::RemoteControl);
        self.can_be_connected =
            self.connection_state == ConnectionState::Disconnected && !self.connectors.is_empty();
        self.can_be_disconnected = matches!(
            self.connection_state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) && self
            .active_connector
            .as_ref()
            .is_some_and(DeviceConnector::supports_disconnect);
    }
}

// ── Holder ──

/// Observable side of a device state: the latest committed snapshot.
#[derive(Debug, Clone, Default)]
pub struct DeviceStateHolderCore {
    holder: ValueHolder<DeviceState>,
}

impl DeviceStateHolderCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<Arc<DeviceState>> {
        self.holder.get()
    }

    pub fn observe(
        &self,
        observer: impl Fn(Option<Arc<DeviceState>>) + Send + Sync + 'static,
    ) -> Ref<DeviceState> {
        self.holder.observe(observer)
    }

    /// Drops the state and its observers, silently.
    pub fn clear(&self) {
        self.holder.clear();
    }

    fn publish(&self, state: DeviceState) {
        self.holder.set(Arc::new(state));
    }
}

// ── State machine ──

/// Mutable connection state machine. Same batching contract as components:
/// `update_*` calls mark the draft dirty only on real changes and
/// `notify_updated` publishes one snapshot.
#[derive(Debug)]
pub struct DeviceStateCore {
    state: DeviceState,
    persisted: bool,
    changed: bool,
    holder: DeviceStateHolderCore,
}

impl DeviceStateCore {
    /// Creates the machine and publishes its initial disconnected state.
    pub fn new(holder: DeviceStateHolderCore) -> Self {
        let state = DeviceState::default();
        holder.publish(state.clone());
        Self {
            state,
            persisted: false,
            changed: false,
            holder,
        }
    }

    /// Current draft, including uncommitted changes.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn has_pending_changes(&self) -> bool {
        self.changed
    }

    /// Sets state and cause as one change.
    pub fn update_connection_state_with_cause(
        &mut self,
        connection_state: ConnectionState,
        cause: ConnectionStateCause,
    ) -> &mut Self {
        if self.state.connection_state != connection_state
            || self.state.connection_state_cause != cause
        {
            self.state.connection_state = connection_state;
            self.state.connection_state_cause = cause;
            self.touch();
        }
        self
    }

    /// Sets the state, keeping the previous cause.
    pub fn update_connection_state(&mut self, connection_state: ConnectionState) -> &mut Self {
        let cause = self.state.connection_state_cause;
        self.update_connection_state_with_cause(connection_state, cause)
    }

    pub fn update_connectors(&mut self, connectors: Vec<DeviceConnector>) -> &mut Self {
        let same = self.state.connectors.len() == connectors.len()
            && self
                .state
                .connectors
                .iter()
                .zip(&connectors)
                .all(|(old, new)| old.is_identical(new));
        if !same {
            self.state.connectors = connectors;
            self.touch();
        }
        self
    }

    pub fn update_active_connector(&mut self, connector: Option<DeviceConnector>) -> &mut Self {
        let same = match (&self.state.active_connector, &connector) {
            (Some(old), Some(new)) => old.is_identical(new),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.state.active_connector = connector;
            self.touch();
        }
        self
    }

    pub fn update_persisted(&mut self, persisted: bool) -> &mut Self {
        if self.persisted != persisted {
            self.persisted = persisted;
            self.touch();
        }
        self
    }

    /// Publishes the draft if anything changed since the last commit.
    pub fn notify_updated(&mut self) {
        if !self.changed {
            return;
        }
        self.changed = false;
        debug!(
            state = %self.state.connection_state,
            cause = %self.state.connection_state_cause,
            connectors = self.state.connectors.len(),
            "device state updated"
        );
        self.holder.publish(self.state.clone());
    }

    fn touch(&mut self) {
        self.changed = true;
        self.state.recompute(self.persisted);
    }
}
