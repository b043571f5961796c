// ── Manual copter piloting controller ──
//
// Owns the manual piloting interface of a drone. Application commands go
// out through a transport-backed backend; settings and their bounds come
// back from the drone and are persisted for offline display.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use groundlink_core::ComponentLifecycle;
use groundlink_core::piloting_itf::{
    ActivationState, ManualCopterBackend, ManualCopterPilotingItfCore,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{ComponentController, ControllerContext};
use crate::message::{
    FeatureMessage, MotionState, PilotingSettingsStateEvent, PilotingStateEvent,
    SpeedSettingsStateEvent, WireFlyingState,
};
use crate::settings::SettingsStore;
use crate::transport::{DeviceCommand, Transport};

const SETTINGS_KEY: &str = "ManualCopter";

const MAX_PITCH_ROLL: &str = "maxPitchRoll";
const MAX_VERTICAL_SPEED: &str = "maxVerticalSpeed";
const MAX_YAW_ROTATION_SPEED: &str = "maxYawRotationSpeed";
const MOTION_DETECTION: &str = "motionDetection";

type BoundedUpdate = for<'a> fn(
    &'a mut ManualCopterPilotingItfCore,
    Option<f64>,
    Option<f64>,
    Option<f64>,
) -> &'a mut ManualCopterPilotingItfCore;

const BOUNDED_SETTINGS: [(&str, BoundedUpdate); 3] = [
    (MAX_PITCH_ROLL, ManualCopterPilotingItfCore::update_max_pitch_roll),
    (MAX_VERTICAL_SPEED, ManualCopterPilotingItfCore::update_max_vertical_speed),
    (
        MAX_YAW_ROTATION_SPEED,
        ManualCopterPilotingItfCore::update_max_yaw_rotation_speed,
    ),
];

// ── Backend ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct PilotingValues {
    roll: i8,
    pitch: i8,
    yaw: i8,
    gaz: i8,
}

struct TransportBackend {
    uid: String,
    transport: Arc<dyn Transport>,
    connected: AtomicBool,
    piloting: Mutex<PilotingValues>,
}

impl TransportBackend {
    fn send(&self, command: DeviceCommand) -> bool {
        if !self.connected.load(Ordering::Acquire) {
            debug!(device = %self.uid, ?command, "not connected, command dropped");
            return false;
        }
        self.transport.send(&self.uid, command)
    }

    fn update_piloting(&self, update: impl FnOnce(&mut PilotingValues)) {
        let values = {
            let mut piloting = self.piloting.lock();
            update(&mut piloting);
            *piloting
        };
        self.send(DeviceCommand::Piloting {
            roll: values.roll,
            pitch: values.pitch,
            yaw: values.yaw,
            gaz: values.gaz,
        });
    }
}

impl fmt::Debug for TransportBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportBackend")
            .field("uid", &self.uid)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl ManualCopterBackend for TransportBackend {
    /// Manual piloting is the default interface, so activation needs no
    /// device round-trip.
    fn activate(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn set_roll(&self, roll: i8) {
        self.update_piloting(|p| p.roll = roll);
    }

    fn set_pitch(&self, pitch: i8) {
        self.update_piloting(|p| p.pitch = pitch);
    }

    fn set_yaw_rotation_speed(&self, speed: i8) {
        self.update_piloting(|p| p.yaw = speed);
    }

    fn set_vertical_speed(&self, speed: i8) {
        self.update_piloting(|p| p.gaz = speed);
    }

    fn hover(&self) {
        self.update_piloting(|p| {
            p.roll = 0;
            p.pitch = 0;
        });
    }

    fn take_off(&self) {
        self.send(DeviceCommand::TakeOff);
    }

    fn thrown_take_off(&self) {
        self.send(DeviceCommand::ThrownTakeOff);
    }

    fn land(&self) {
        self.send(DeviceCommand::Land);
    }

    fn emergency_cut_out(&self) {
        self.send(DeviceCommand::EmergencyCutOut);
    }

    fn set_max_pitch_roll(&self, value: f64) -> bool {
        self.send(DeviceCommand::SetMaxTilt { value })
    }

    fn set_max_vertical_speed(&self, value: f64) -> bool {
        self.send(DeviceCommand::SetMaxVerticalSpeed { value })
    }

    fn set_max_yaw_rotation_speed(&self, value: f64) -> bool {
        self.send(DeviceCommand::SetMaxRotationSpeed { value })
    }

    fn set_use_thrown_take_off_for_smart_take_off(&self, enabled: bool) -> bool {
        self.send(DeviceCommand::SetMotionDetection { enabled })
    }
}

// ── Controller ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ManualCopterController {
    itf: ManualCopterPilotingItfCore,
    backend: Arc<TransportBackend>,
    settings: SettingsStore,
    offline_settings: bool,
}

impl ManualCopterController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        let backend = Arc::new(TransportBackend {
            uid: ctx.device.uid().to_owned(),
            transport: Arc::clone(ctx.transport),
            connected: AtomicBool::new(false),
            piloting: Mutex::new(PilotingValues::default()),
        });
        let mut ctrl = Self {
            itf: ManualCopterPilotingItfCore::new(ctx.device.piloting_itf_store(), backend.clone()),
            backend,
            settings: ctx.settings.child(SETTINGS_KEY),
            offline_settings: ctx.config.offline_settings,
        };
        if ctrl.keeps_offline() {
            ctrl.load_persisted();
            ctrl.itf.publish();
        }
        ctrl
    }

    fn keeps_offline(&self) -> bool {
        self.offline_settings && !self.settings.is_new()
    }

    fn load_persisted(&mut self) {
        for (key, update) in BOUNDED_SETTINGS {
            if let Some((min, value, max)) = self.settings.read::<(f64, f64, f64)>(key) {
                update(&mut self.itf, Some(min), Some(value), Some(max));
            }
        }
        if let Some(enabled) = self.settings.read::<bool>(MOTION_DETECTION) {
            self.itf.update_use_thrown_take_off_for_smart_take_off(enabled);
        }
    }

    fn on_bounded_setting(&mut self, key: &str, current: f64, min: f64, max: f64) {
        if min > max {
            warn!(setting = key, min, max, "inverted setting bounds, skipping event");
            return;
        }
        let Some((_, update)) = BOUNDED_SETTINGS.into_iter().find(|(k, _)| *k == key) else {
            return;
        };
        update(&mut self.itf, Some(min), Some(current), Some(max)).notify_updated();
        self.settings.write(key, &(min, current, max)).commit();
    }

    fn on_flying_state(&mut self, state: WireFlyingState) {
        let (can_take_off, can_land) = match state {
            WireFlyingState::Landed | WireFlyingState::Landing => (true, false),
            WireFlyingState::TakingOff
            | WireFlyingState::Hovering
            | WireFlyingState::MotorRamping
            | WireFlyingState::UserTakeOff
            | WireFlyingState::Flying => (false, true),
            WireFlyingState::Emergency | WireFlyingState::EmergencyLanding => (false, false),
            WireFlyingState::Unknown => {
                warn!("unknown flying state, skipping event");
                return;
            }
        };
        self.itf
            .update_can_take_off(can_take_off)
            .update_can_land(can_land)
            .notify_updated();
    }
}

impl ComponentController for ManualCopterController {
    fn did_connect(&mut self) {
        self.backend.connected.store(true, Ordering::Release);
        self.itf.update_state(ActivationState::Active);
        self.itf.publish();
    }

    fn did_disconnect(&mut self) {
        self.backend.connected.store(false, Ordering::Release);
        self.itf
            .update_can_land(false)
            .update_can_take_off(false)
            .update_smart_will_thrown_take_off(false)
            .update_state(ActivationState::Unavailable)
            .notify_updated();
        if !self.keeps_offline() {
            self.itf.unpublish();
        }
    }

    fn will_forget(&mut self) {
        self.settings.clear();
        self.itf.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        match message {
            FeatureMessage::PilotingState(PilotingStateEvent::FlyingStateChanged { state }) => {
                self.on_flying_state(*state);
            }
            FeatureMessage::PilotingState(PilotingStateEvent::MotionState { state }) => {
                let moving = match state {
                    MotionState::Steady => false,
                    MotionState::Moving => true,
                    MotionState::Unknown => {
                        warn!("unknown motion state, skipping event");
                        return;
                    }
                };
                self.itf.update_smart_will_thrown_take_off(moving).notify_updated();
            }
            FeatureMessage::PilotingSettingsState(event) => match *event {
                PilotingSettingsStateEvent::MaxTiltChanged { current, min, max } => {
                    self.on_bounded_setting(MAX_PITCH_ROLL, current, min, max);
                }
                PilotingSettingsStateEvent::MotionDetection { enabled } => {
                    self.itf
                        .update_use_thrown_take_off_for_smart_take_off(enabled)
                        .notify_updated();
                    self.settings.write(MOTION_DETECTION, &enabled).commit();
                }
                PilotingSettingsStateEvent::Unknown => {}
            },
            FeatureMessage::SpeedSettingsState(event) => match *event {
                SpeedSettingsStateEvent::MaxVerticalSpeedChanged { current, min, max } => {
                    self.on_bounded_setting(MAX_VERTICAL_SPEED, current, min, max);
                }
                SpeedSettingsStateEvent::MaxRotationSpeedChanged { current, min, max } => {
                    self.on_bounded_setting(MAX_YAW_ROTATION_SPEED, current, min, max);
                }
                SpeedSettingsStateEvent::Unknown => {}
            },
            _ => {}
        }
    }
}
