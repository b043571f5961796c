// ── Alarms controller ──

use std::time::Duration;

use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::{AlarmKind, AlarmLevel, AlarmsCore};
use tracing::warn;

use super::{ComponentController, ControllerContext};
use crate::message::{
    AlertState, BatteryAlert, BatteryAlertLevel, BatteryEvent, CommonStateEvent, FeatureMessage,
    ForcedLandingReason, ListFlags, PilotingStateEvent, Sensor, SettingsStateEvent,
    WarningLevel, WireFlyingState, WireMotorError,
};

const SUPPORTED: [AlarmKind; 12] = [
    AlarmKind::Power,
    AlarmKind::MotorCutOut,
    AlarmKind::UserEmergency,
    AlarmKind::MotorError,
    AlarmKind::BatteryTooHot,
    AlarmKind::BatteryTooCold,
    AlarmKind::HoveringDifficultiesNoGpsTooDark,
    AlarmKind::HoveringDifficultiesNoGpsTooHigh,
    AlarmKind::AutomaticLandingBatteryIssue,
    AlarmKind::Wind,
    AlarmKind::VerticalCamera,
    AlarmKind::StrongVibrations,
];

const BATTERY_ALARMS: [AlarmKind; 3] = [
    AlarmKind::Power,
    AlarmKind::BatteryTooHot,
    AlarmKind::BatteryTooCold,
];

#[derive(Debug)]
pub struct AlarmsController {
    alarms: AlarmsCore,
    /// Set once the device reports battery alerts through the battery
    /// feature; piloting-state battery alerts are then ignored.
    battery_feature_supported: bool,
    is_flying: bool,
    /// Last reported hovering levels: (too dark, too high).
    hovering: (AlarmLevel, AlarmLevel),
    /// Automatic landing delays at or below this are critical.
    critical_delay: Duration,
}

impl AlarmsController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            alarms: AlarmsCore::new(ctx.device.instrument_store(), &SUPPORTED),
            battery_feature_supported: false,
            is_flying: false,
            hovering: (AlarmLevel::Off, AlarmLevel::Off),
            critical_delay: ctx.config.auto_landing_critical_delay,
        }
    }

    /// Hovering alarms only apply in flight; on the ground they stay off.
    fn update_hovering_difficulties(&mut self) {
        let (too_dark, too_high) = if self.is_flying {
            self.hovering
        } else {
            (AlarmLevel::Off, AlarmLevel::Off)
        };
        self.alarms
            .update_level(AlarmKind::HoveringDifficultiesNoGpsTooDark, too_dark)
            .update_level(AlarmKind::HoveringDifficultiesNoGpsTooHigh, too_high)
            .notify_updated();
    }

    fn on_piloting_state(&mut self, event: &PilotingStateEvent) {
        match event {
            PilotingStateEvent::AlertStateChanged { state } => self.on_alert_state(*state),
            PilotingStateEvent::HoveringWarning {
                no_gps_too_dark,
                no_gps_too_high,
            } => {
                self.hovering = (warning_if(*no_gps_too_dark), warning_if(*no_gps_too_high));
                self.update_hovering_difficulties();
            }
            PilotingStateEvent::ForcedLandingAutoTrigger { reason, delay } => {
                self.on_forced_landing(*reason, *delay);
            }
            PilotingStateEvent::FlyingStateChanged { state } => {
                let is_flying = matches!(state, WireFlyingState::Hovering | WireFlyingState::Flying);
                if is_flying != self.is_flying {
                    self.is_flying = is_flying;
                    self.update_hovering_difficulties();
                }
            }
            PilotingStateEvent::WindStateChanged { state } => {
                if let Some(level) = warning_level(*state, "wind") {
                    self.alarms.update_level(AlarmKind::Wind, level).notify_updated();
                }
            }
            PilotingStateEvent::VibrationLevelChanged { state } => {
                if let Some(level) = warning_level(*state, "vibration") {
                    self.alarms
                        .update_level(AlarmKind::StrongVibrations, level)
                        .notify_updated();
                }
            }
            _ => {}
        }
    }

    fn on_alert_state(&mut self, state: AlertState) {
        let alarms = &mut self.alarms;
        match state {
            AlertState::None => {
                if !self.battery_feature_supported {
                    alarms.update_level(AlarmKind::Power, AlarmLevel::Off);
                }
                alarms
                    .update_level(AlarmKind::MotorCutOut, AlarmLevel::Off)
                    .update_level(AlarmKind::UserEmergency, AlarmLevel::Off)
                    .notify_updated();
            }
            AlertState::CutOut => {
                alarms
                    .update_level(AlarmKind::MotorCutOut, AlarmLevel::Critical)
                    .update_level(AlarmKind::UserEmergency, AlarmLevel::Off)
                    .notify_updated();
            }
            AlertState::User => {
                alarms
                    .update_level(AlarmKind::MotorCutOut, AlarmLevel::Off)
                    .update_level(AlarmKind::UserEmergency, AlarmLevel::Critical)
                    .notify_updated();
            }
            AlertState::CriticalBattery | AlertState::LowBattery => {
                if self.battery_feature_supported {
                    return;
                }
                let level = if state == AlertState::CriticalBattery {
                    AlarmLevel::Critical
                } else {
                    AlarmLevel::Warning
                };
                alarms
                    .update_level(AlarmKind::Power, level)
                    .update_level(AlarmKind::MotorCutOut, AlarmLevel::Off)
                    .update_level(AlarmKind::UserEmergency, AlarmLevel::Off)
                    .notify_updated();
            }
            // No alarm models this alert.
            AlertState::TooMuchAngle => {}
            AlertState::Unknown => warn!("unknown alert state, skipping event"),
        }
    }

    fn on_forced_landing(&mut self, reason: ForcedLandingReason, delay: u32) {
        let delay = Duration::from_secs(u64::from(delay));
        match reason {
            ForcedLandingReason::None => {
                self.alarms
                    .update_level(AlarmKind::AutomaticLandingBatteryIssue, AlarmLevel::Off)
                    .update_automatic_landing_delay(Duration::ZERO);
            }
            ForcedLandingReason::BatteryCriticalSoon => {
                let level = if delay > self.critical_delay {
                    AlarmLevel::Warning
                } else {
                    AlarmLevel::Critical
                };
                self.alarms
                    .update_level(AlarmKind::AutomaticLandingBatteryIssue, level)
                    .update_automatic_landing_delay(delay);
            }
            ForcedLandingReason::Unknown => {
                warn!("unknown forced landing reason, skipping event");
                return;
            }
        }
        self.alarms.notify_updated();
    }

    fn on_battery_alert(&mut self, alert: BatteryAlert, level: BatteryAlertLevel, flags: ListFlags) {
        self.battery_feature_supported = true;

        if flags.contains(ListFlags::EMPTY) {
            self.clear_battery_alarms();
            self.alarms.notify_updated();
            return;
        }

        let kind = match alert {
            BatteryAlert::PowerLevel => Some(AlarmKind::Power),
            BatteryAlert::TooHot => Some(AlarmKind::BatteryTooHot),
            BatteryAlert::TooCold => Some(AlarmKind::BatteryTooCold),
            BatteryAlert::Unknown => {
                warn!("unknown battery alert, skipping item");
                None
            }
        };
        if let Some(kind) = kind {
            if flags.contains(ListFlags::REMOVE) {
                self.alarms.update_level(kind, AlarmLevel::Off);
            } else {
                if flags.contains(ListFlags::FIRST) {
                    self.clear_battery_alarms();
                }
                let level = match level {
                    BatteryAlertLevel::None => Some(AlarmLevel::Off),
                    BatteryAlertLevel::Warning => Some(AlarmLevel::Warning),
                    BatteryAlertLevel::Critical => Some(AlarmLevel::Critical),
                    BatteryAlertLevel::Unknown => None,
                };
                if let Some(level) = level {
                    self.alarms.update_level(kind, level);
                }
            }
        }
        if flags.contains(ListFlags::LAST) {
            self.alarms.notify_updated();
        }
    }

    fn clear_battery_alarms(&mut self) {
        for kind in BATTERY_ALARMS {
            self.alarms.update_level(kind, AlarmLevel::Off);
        }
    }
}

impl ComponentController for AlarmsController {
    fn did_connect(&mut self) {
        self.alarms.publish();
    }

    fn did_disconnect(&mut self) {
        self.alarms.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        match message {
            FeatureMessage::PilotingState(event) => self.on_piloting_state(event),
            FeatureMessage::SettingsState(SettingsStateEvent::MotorErrorStateChanged {
                error,
                ..
            }) => {
                let level = if *error == WireMotorError::NoError {
                    AlarmLevel::Off
                } else {
                    AlarmLevel::Critical
                };
                self.alarms.update_level(AlarmKind::MotorError, level).notify_updated();
            }
            FeatureMessage::Battery(BatteryEvent::Alert {
                alert,
                level,
                list_flags,
            }) => self.on_battery_alert(*alert, *level, *list_flags),
            FeatureMessage::CommonState(CommonStateEvent::SensorsStatesListChanged {
                sensor: Sensor::VerticalCamera,
                ok,
            }) => {
                let level = if *ok { AlarmLevel::Off } else { AlarmLevel::Critical };
                self.alarms
                    .update_level(AlarmKind::VerticalCamera, level)
                    .notify_updated();
            }
            _ => {}
        }
    }
}

fn warning_if(set: bool) -> AlarmLevel {
    if set { AlarmLevel::Warning } else { AlarmLevel::Off }
}

fn warning_level(level: WarningLevel, what: &str) -> Option<AlarmLevel> {
    match level {
        WarningLevel::Ok => Some(AlarmLevel::Off),
        WarningLevel::Warning => Some(AlarmLevel::Warning),
        WarningLevel::Critical => Some(AlarmLevel::Critical),
        WarningLevel::Unknown => {
            warn!(what, "unknown warning level, skipping event");
            None
        }
    }
}
