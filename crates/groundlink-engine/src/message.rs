// ── Feature messages ──
//
// Typed, already-decoded device events grouped by protocol feature. The
// JSON shape is `{"feature": "...", "event": {"type": "...", ...}}`.
// Every enumerated wire value has an `Unknown` fallback so newer firmware
// values deserialize and get skipped instead of failing the whole message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", content = "event", rename_all = "snake_case")]
pub enum FeatureMessage {
    PilotingState(PilotingStateEvent),
    PilotingSettingsState(PilotingSettingsStateEvent),
    SpeedSettingsState(SpeedSettingsStateEvent),
    SettingsState(SettingsStateEvent),
    Battery(BatteryEvent),
    CommonState(CommonStateEvent),
    GpsSettingsState(GpsSettingsStateEvent),
    GpsState(GpsStateEvent),
}

// ── Piloting state ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PilotingStateEvent {
    AlertStateChanged {
        state: AlertState,
    },
    HoveringWarning {
        no_gps_too_dark: bool,
        no_gps_too_high: bool,
    },
    ForcedLandingAutoTrigger {
        reason: ForcedLandingReason,
        /// Seconds before the automatic landing starts.
        delay: u32,
    },
    FlyingStateChanged {
        state: WireFlyingState,
    },
    WindStateChanged {
        state: WarningLevel,
    },
    VibrationLevelChanged {
        state: WarningLevel,
    },
    MotionState {
        state: MotionState,
    },
    /// Legacy position report. Coordinates equal to [`UNKNOWN_COORDINATE`]
    /// mean no fix.
    PositionChanged {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },
    /// Position report with accuracies, in meters.
    GpsLocationChanged {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        latitude_accuracy: i32,
        longitude_accuracy: i32,
        altitude_accuracy: i32,
    },
    /// Altitude relative to take-off, in meters.
    AltitudeChanged {
        altitude: f64,
    },
    AltitudeAboveGroundChanged {
        altitude: f64,
    },
    /// Speed in the NED frame, in meters per second.
    SpeedChanged {
        speed_x: f64,
        speed_y: f64,
        speed_z: f64,
    },
    /// Attitude in radians.
    AttitudeChanged {
        roll: f64,
        pitch: f64,
        yaw: f64,
    },
    #[serde(other)]
    Unknown,
}

/// Latitude or longitude value sent when the position is not known.
pub const UNKNOWN_COORDINATE: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertState {
    None,
    User,
    CutOut,
    CriticalBattery,
    LowBattery,
    TooMuchAngle,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForcedLandingReason {
    None,
    BatteryCriticalSoon,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WireFlyingState {
    Landed,
    TakingOff,
    Hovering,
    Flying,
    Landing,
    Emergency,
    UserTakeOff,
    MotorRamping,
    EmergencyLanding,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarningLevel {
    Ok,
    Warning,
    Critical,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MotionState {
    Steady,
    Moving,
    #[serde(other)]
    Unknown,
}

// ── Piloting & speed settings ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PilotingSettingsStateEvent {
    /// Max pitch/roll, in degrees.
    MaxTiltChanged { current: f64, min: f64, max: f64 },
    MotionDetection { enabled: bool },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeedSettingsStateEvent {
    /// Meters per second.
    MaxVerticalSpeedChanged { current: f64, min: f64, max: f64 },
    /// Degrees per second.
    MaxRotationSpeedChanged { current: f64, min: f64, max: f64 },
    #[serde(other)]
    Unknown,
}

// ── Settings state (motors) ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingsStateEvent {
    /// `motor_ids` bit n set means motor n is affected, front left first
    /// then clockwise.
    MotorErrorStateChanged {
        motor_ids: u8,
        error: WireMotorError,
    },
    MotorErrorLastErrorChanged {
        error: WireMotorError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WireMotorError {
    NoError,
    Eeprom,
    MotorStalled,
    PropellerSecurity,
    CommLost,
    RcEmergencyStop,
    RealTime,
    MotorSetting,
    Temperature,
    BatteryVoltage,
    LipoCells,
    Mosfet,
    Bootloader,
    AssertError,
    #[serde(other)]
    Unknown,
}

// ── Battery ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatteryEvent {
    /// One item of the battery alert list.
    Alert {
        alert: BatteryAlert,
        level: BatteryAlertLevel,
        list_flags: ListFlags,
    },
    Health {
        state_of_health: u8,
    },
    CycleCount {
        count: u32,
    },
    Serial {
        serial: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatteryAlert {
    PowerLevel,
    TooHot,
    TooCold,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatteryAlertLevel {
    None,
    Warning,
    Critical,
    #[serde(other)]
    Unknown,
}

/// Generic list-item flags carried by list-style events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListFlags(pub u8);

impl ListFlags {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(1 << 1);
    pub const EMPTY: Self = Self(1 << 2);
    pub const REMOVE: Self = Self(1 << 3);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

// ── Common state ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommonStateEvent {
    BatteryStateChanged { percent: u8 },
    ChargingStateChanged { charging: bool },
    SensorsStatesListChanged { sensor: Sensor, ok: bool },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sensor {
    Imu,
    Barometer,
    Ultrasound,
    Gps,
    Magnetometer,
    VerticalCamera,
    #[serde(other)]
    Unknown,
}

// ── GPS ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GpsSettingsStateEvent {
    GpsFixStateChanged { fixed: bool },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GpsStateEvent {
    NumberOfSatelliteChanged { count: u32 },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_adjacently_tagged_message() {
        let msg: FeatureMessage = serde_json::from_value(json!({
            "feature": "piloting_state",
            "event": { "type": "wind_state_changed", "state": "warning" }
        }))
        .unwrap();
        assert_eq!(
            msg,
            FeatureMessage::PilotingState(PilotingStateEvent::WindStateChanged {
                state: WarningLevel::Warning
            })
        );
    }

    #[test]
    fn unknown_values_fall_back() {
        let msg: FeatureMessage = serde_json::from_value(json!({
            "feature": "piloting_state",
            "event": { "type": "alert_state_changed", "state": "too_much_sun" }
        }))
        .unwrap();
        assert_eq!(
            msg,
            FeatureMessage::PilotingState(PilotingStateEvent::AlertStateChanged {
                state: AlertState::Unknown
            })
        );

        let msg: FeatureMessage = serde_json::from_value(json!({
            "feature": "gps_state",
            "event": { "type": "home_type_changed", "home": 2 }
        }))
        .unwrap();
        assert_eq!(msg, FeatureMessage::GpsState(GpsStateEvent::Unknown));
    }

    #[test]
    fn list_flags() {
        let flags = ListFlags::FIRST.union(ListFlags::LAST);
        assert!(flags.contains(ListFlags::FIRST));
        assert!(flags.contains(ListFlags::LAST));
        assert!(!flags.contains(ListFlags::EMPTY));
        assert_eq!(serde_json::to_value(flags).unwrap(), json!(3));
    }
}
