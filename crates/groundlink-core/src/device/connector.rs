// ── Device connectors ──
//
// A connector is one path to reach a device: directly from the host
// (local) or through a remote control. Ranking: remote control beats local,
// then usb beats wifi beats ble.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceConnectorType {
    Local,
    RemoteControl,
}

impl DeviceConnectorType {
    const fn rank(self) -> u8 {
        match self {
            Self::Local => 0,
            Self::RemoteControl => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceConnectorTechnology {
    Wifi,
    Usb,
    Ble,
}

impl DeviceConnectorTechnology {
    const fn rank(self) -> u8 {
        match self {
            Self::Ble => 0,
            Self::Wifi => 1,
            Self::Usb => 2,
        }
    }
}

/// Equality and hashing ignore `supports_disconnect`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceConnector {
    connector_type: DeviceConnectorType,
    uid: String,
    technology: DeviceConnectorTechnology,
    supports_disconnect: bool,
}

impl DeviceConnector {
    pub fn new(
        connector_type: DeviceConnectorType,
        uid: impl Into<String>,
        technology: DeviceConnectorTechnology,
        supports_disconnect: bool,
    ) -> Self {
        Self {
            connector_type,
            uid: uid.into(),
            technology,
            supports_disconnect,
        }
    }

    /// Direct connector from the host over `technology`.
    pub fn local(technology: DeviceConnectorTechnology) -> Self {
        Self::new(
            DeviceConnectorType::Local,
            format!("local-{technology}"),
            technology,
            true,
        )
    }

    /// Connector through the remote control identified by `rc_uid`.
    pub fn remote_control(rc_uid: impl Into<String>) -> Self {
        Self::new(
            DeviceConnectorType::RemoteControl,
            rc_uid,
            DeviceConnectorTechnology::Wifi,
            false,
        )
    }

    pub fn connector_type(&self) -> DeviceConnectorType {
        self.connector_type
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn technology(&self) -> DeviceConnectorTechnology {
        self.technology
    }

    pub fn supports_disconnect(&self) -> bool {
        self.supports_disconnect
    }

    /// Ranking order: type first, technology second. Uid is not ranked.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.connector_type
            .rank()
            .cmp(&other.connector_type.rank())
            .then(self.technology.rank().cmp(&other.technology.rank()))
    }

    pub fn better_than(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Greater
    }

    /// Equality including disconnect support, which `==` ignores.
    pub fn is_identical(&self, other: &Self) -> bool {
        self == other && self.supports_disconnect == other.supports_disconnect
    }
}

impl PartialEq for DeviceConnector {
    fn eq(&self, other: &Self) -> bool {
        self.connector_type == other.connector_type
            && self.uid == other.uid
            && self.technology == other.technology
    }
}

impl Eq for DeviceConnector {}

impl Hash for DeviceConnector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.connector_type.hash(state);
        self.uid.hash(state);
        self.technology.hash(state);
    }
}

impl fmt::Display for DeviceConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.connector_type {
            DeviceConnectorType::Local => write!(f, "local-{}", self.technology),
            DeviceConnectorType::RemoteControl => write!(f, "remote_control-{}", self.uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_control_beats_any_local() {
        let rc = DeviceConnector::remote_control("rc-1");
        let usb = DeviceConnector::local(DeviceConnectorTechnology::Usb);
        assert!(rc.better_than(&usb));
        assert!(!usb.better_than(&rc));
    }

    #[test]
    fn technology_ranks_usb_wifi_ble() {
        let usb = DeviceConnector::local(DeviceConnectorTechnology::Usb);
        let wifi = DeviceConnector::local(DeviceConnectorTechnology::Wifi);
        let ble = DeviceConnector::local(DeviceConnectorTechnology::Ble);
        assert!(usb.better_than(&wifi));
        assert!(wifi.better_than(&ble));
        assert!(!wifi.better_than(&wifi));
    }

    #[test]
    fn equality_ignores_disconnect_support() {
        let a = DeviceConnector::new(
            DeviceConnectorType::Local,
            "local-wifi",
            DeviceConnectorTechnology::Wifi,
            false,
        );
        assert_eq!(a, DeviceConnector::local(DeviceConnectorTechnology::Wifi));
        assert_ne!(
            DeviceConnector::remote_control("a"),
            DeviceConnector::remote_control("b")
        );
    }

    #[test]
    fn identity_includes_disconnect_support() {
        let wifi = DeviceConnector::local(DeviceConnectorTechnology::Wifi);
        let pinned = DeviceConnector::new(
            DeviceConnectorType::Local,
            "local-wifi",
            DeviceConnectorTechnology::Wifi,
            false,
        );
        assert!(wifi.is_identical(&wifi.clone()));
        assert!(!wifi.is_identical(&pinned));
    }

    #[test]
    fn display_names_path() {
        assert_eq!(
            DeviceConnector::local(DeviceConnectorTechnology::Ble).to_string(),
            "local-ble"
        );
        assert_eq!(
            DeviceConnector::remote_control("PI040").to_string(),
            "remote_control-PI040"
        );
    }
}
