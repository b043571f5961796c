// ── Transport boundary ──
//
// Link-level actions the engine asks of whatever carries device traffic.
// Results of `connect`/`disconnect` come back later as link events on the
// engine; the return value only says whether the request was accepted.

use groundlink_core::DeviceConnector;
use serde::Serialize;

/// Outgoing device commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DeviceCommand {
    TakeOff,
    ThrownTakeOff,
    Land,
    EmergencyCutOut,
    /// Continuous piloting values, signed percent of the configured maxima.
    Piloting {
        roll: i8,
        pitch: i8,
        yaw: i8,
        gaz: i8,
    },
    SetMaxTilt {
        value: f64,
    },
    SetMaxVerticalSpeed {
        value: f64,
    },
    SetMaxRotationSpeed {
        value: f64,
    },
    SetMotionDetection {
        enabled: bool,
    },
}

pub trait Transport: Send + Sync {
    fn connect(&self, uid: &str, connector: &DeviceConnector, password: Option<&str>) -> bool;

    fn disconnect(&self, uid: &str) -> bool;

    fn send(&self, uid: &str, command: DeviceCommand) -> bool;
}
