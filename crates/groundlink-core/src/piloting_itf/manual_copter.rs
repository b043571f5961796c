// ── Manual copter piloting interface ──

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{ActivationState, DoubleSetting};
use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, PilotingItf, PilotingItfs,
};
use crate::store::ComponentStoreCore;

const SIGNED_PERCENT: std::ops::RangeInclusive<i8> = -100..=100;

/// Device-side implementation of the manual piloting commands.
pub trait ManualCopterBackend: Send + Sync + fmt::Debug {
    fn activate(&self) -> bool;
    fn set_roll(&self, roll: i8);
    fn set_pitch(&self, pitch: i8);
    fn set_yaw_rotation_speed(&self, speed: i8);
    fn set_vertical_speed(&self, speed: i8);
    fn hover(&self);
    fn take_off(&self);
    fn thrown_take_off(&self);
    fn land(&self);
    fn emergency_cut_out(&self);
    fn set_max_pitch_roll(&self, value: f64) -> bool;
    fn set_max_vertical_speed(&self, value: f64) -> bool;
    fn set_max_yaw_rotation_speed(&self, value: f64) -> bool;
    fn set_use_thrown_take_off_for_smart_take_off(&self, enabled: bool) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SmartTakeOffLandAction {
    None,
    TakeOff,
    ThrownTakeOff,
    Land,
}

/// Published manual piloting snapshot. Commands go straight to the backend;
/// setting values change once the device confirms them.
#[derive(Debug, Clone, Serialize)]
pub struct ManualCopterPilotingItf {
    state: ActivationState,
    can_take_off: bool,
    can_land: bool,
    smart_will_thrown_take_off: bool,
    max_pitch_roll: DoubleSetting,
    max_vertical_speed: DoubleSetting,
    max_yaw_rotation_speed: DoubleSetting,
    use_thrown_take_off_for_smart_take_off: Option<bool>,
    #[serde(skip)]
    backend: Arc<dyn ManualCopterBackend>,
}

impl ManualCopterPilotingItf {
    fn new(backend: Arc<dyn ManualCopterBackend>) -> Self {
        Self {
            state: ActivationState::Unavailable,
            can_take_off: false,
            can_land: false,
            smart_will_thrown_take_off: false,
            max_pitch_roll: DoubleSetting::default(),
            max_vertical_speed: DoubleSetting::default(),
            max_yaw_rotation_speed: DoubleSetting::default(),
            use_thrown_take_off_for_smart_take_off: None,
            backend,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn can_take_off(&self) -> bool {
        self.can_take_off
    }

    pub fn can_land(&self) -> bool {
        self.can_land
    }

    pub fn max_pitch_roll(&self) -> DoubleSetting {
        self.max_pitch_roll
    }

    pub fn max_vertical_speed(&self) -> DoubleSetting {
        self.max_vertical_speed
    }

    pub fn max_yaw_rotation_speed(&self) -> DoubleSetting {
        self.max_yaw_rotation_speed
    }

    /// `None` when the device has no thrown take-off support.
    pub fn use_thrown_take_off_for_smart_take_off(&self) -> Option<bool> {
        self.use_thrown_take_off_for_smart_take_off
    }

    /// What [`smart_take_off_land`](Self::smart_take_off_land) would do now.
    pub fn smart_take_off_land_action(&self) -> SmartTakeOffLandAction {
        if self.can_land {
            SmartTakeOffLandAction::Land
        } else if self.can_take_off {
            if self.use_thrown_take_off_for_smart_take_off == Some(true)
                && self.smart_will_thrown_take_off
            {
                SmartTakeOffLandAction::ThrownTakeOff
            } else {
                SmartTakeOffLandAction::TakeOff
            }
        } else {
            SmartTakeOffLandAction::None
        }
    }

    /// Requests activation. Only possible from the idle state.
    pub fn activate(&self) -> bool {
        self.state == ActivationState::Idle && self.backend.activate()
    }

    pub fn set_pitch(&self, pitch: i32) {
        self.backend.set_pitch(signed_percent(pitch));
    }

    pub fn set_roll(&self, roll: i32) {
        self.backend.set_roll(signed_percent(roll));
    }

    pub fn set_yaw_rotation_speed(&self, speed: i32) {
        self.backend.set_yaw_rotation_speed(signed_percent(speed));
    }

    pub fn set_vertical_speed(&self, speed: i32) {
        self.backend.set_vertical_speed(signed_percent(speed));
    }

    pub fn hover(&self) {
        self.backend.hover();
    }

    pub fn take_off(&self) {
        self.backend.take_off();
    }

    pub fn thrown_take_off(&self) {
        self.backend.thrown_take_off();
    }

    pub fn land(&self) {
        self.backend.land();
    }

    pub fn emergency_cut_out(&self) {
        self.backend.emergency_cut_out();
    }

    pub fn smart_take_off_land(&self) {
        match self.smart_take_off_land_action() {
            SmartTakeOffLandAction::TakeOff => self.take_off(),
            SmartTakeOffLandAction::ThrownTakeOff => self.thrown_take_off(),
            SmartTakeOffLandAction::Land => self.land(),
            SmartTakeOffLandAction::None => {}
        }
    }

    /// Sends a new max pitch/roll, clamped to the setting bounds. Returns
    /// whether a request was sent.
    pub fn set_max_pitch_roll(&self, value: f64) -> bool {
        let value = self.max_pitch_roll.clamp(value);
        value != self.max_pitch_roll.value && self.backend.set_max_pitch_roll(value)
    }

    pub fn set_max_vertical_speed(&self, value: f64) -> bool {
        let value = self.max_vertical_speed.clamp(value);
        value != self.max_vertical_speed.value && self.backend.set_max_vertical_speed(value)
    }

    pub fn set_max_yaw_rotation_speed(&self, value: f64) -> bool {
        let value = self.max_yaw_rotation_speed.clamp(value);
        value != self.max_yaw_rotation_speed.value
            && self.backend.set_max_yaw_rotation_speed(value)
    }

    pub fn set_use_thrown_take_off_for_smart_take_off(&self, enabled: bool) -> bool {
        match self.use_thrown_take_off_for_smart_take_off {
            Some(current) if current != enabled => self
                .backend
                .set_use_thrown_take_off_for_smart_take_off(enabled),
            _ => false,
        }
    }
}

fn signed_percent(value: i32) -> i8 {
    let bounded = value.clamp(
        i32::from(*SIGNED_PERCENT.start()),
        i32::from(*SIGNED_PERCENT.end()),
    );
    i8::try_from(bounded).unwrap_or_default()
}

impl Component for ManualCopterPilotingItf {
    fn uid(&self) -> ComponentUid {
        PilotingItfs::MANUAL_COPTER.uid()
    }
}

impl PilotingItf for ManualCopterPilotingItf {}

#[derive(Debug)]
pub struct ManualCopterPilotingItfCore {
    core: ComponentCore<ManualCopterPilotingItf>,
}

impl ManualCopterPilotingItfCore {
    pub fn new(store: &ComponentStoreCore, backend: Arc<dyn ManualCopterBackend>) -> Self {
        Self {
            core: ComponentCore::new(store, ManualCopterPilotingItf::new(backend)),
        }
    }

    pub fn update_state(&mut self, state: ActivationState) -> &mut Self {
        self.core.update_field(|p| &mut p.state, state);
        self
    }

    pub fn update_can_take_off(&mut self, value: bool) -> &mut Self {
        self.core.update_field(|p| &mut p.can_take_off, value);
        self
    }

    pub fn update_can_land(&mut self, value: bool) -> &mut Self {
        self.core.update_field(|p| &mut p.can_land, value);
        self
    }

    pub fn update_smart_will_thrown_take_off(&mut self, value: bool) -> &mut Self {
        self.core
            .update_field(|p| &mut p.smart_will_thrown_take_off, value);
        self
    }

    pub fn update_max_pitch_roll(
        &mut self,
        min: Option<f64>,
        value: Option<f64>,
        max: Option<f64>,
    ) -> &mut Self {
        self.core
            .edit(|p| p.max_pitch_roll.update(min, value, max));
        self
    }

    pub fn update_max_vertical_speed(
        &mut self,
        min: Option<f64>,
        value: Option<f64>,
        max: Option<f64>,
    ) -> &mut Self {
        self.core
            .edit(|p| p.max_vertical_speed.update(min, value, max));
        self
    }

    pub fn update_max_yaw_rotation_speed(
        &mut self,
        min: Option<f64>,
        value: Option<f64>,
        max: Option<f64>,
    ) -> &mut Self {
        self.core
            .edit(|p| p.max_yaw_rotation_speed.update(min, value, max));
        self
    }

    /// The first value received also makes the setting available.
    pub fn update_use_thrown_take_off_for_smart_take_off(&mut self, enabled: bool) -> &mut Self {
        self.core.update_field(
            |p| &mut p.use_thrown_take_off_for_smart_take_off,
            Some(enabled),
        );
        self
    }

    /// Back to the disconnected defaults: unavailable, no take-off or land
    /// capability, optional settings dropped.
    pub fn reset(&mut self) -> &mut Self {
        self.update_state(ActivationState::Unavailable)
            .update_can_take_off(false)
            .update_can_land(false)
            .update_smart_will_thrown_take_off(false);
        self.core
            .update_field(|p| &mut p.use_thrown_take_off_for_smart_take_off, None);
        self
    }
}

impl ComponentLifecycle for ManualCopterPilotingItfCore {
    type Snapshot = ManualCopterPilotingItf;

    fn core(&self) -> &ComponentCore<ManualCopterPilotingItf> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<ManualCopterPilotingItf> {
        &mut self.core
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl ManualCopterBackend for RecordingBackend {
        fn activate(&self) -> bool {
            self.record("activate");
            true
        }
        fn set_roll(&self, roll: i8) {
            self.record(format!("roll {roll}"));
        }
        fn set_pitch(&self, pitch: i8) {
            self.record(format!("pitch {pitch}"));
        }
        fn set_yaw_rotation_speed(&self, speed: i8) {
            self.record(format!("yaw {speed}"));
        }
        fn set_vertical_speed(&self, speed: i8) {
            self.record(format!("gaz {speed}"));
        }
        fn hover(&self) {
            self.record("hover");
        }
        fn take_off(&self) {
            self.record("take_off");
        }
        fn thrown_take_off(&self) {
            self.record("thrown_take_off");
        }
        fn land(&self) {
            self.record("land");
        }
        fn emergency_cut_out(&self) {
            self.record("emergency");
        }
        fn set_max_pitch_roll(&self, value: f64) -> bool {
            self.record(format!("max_pitch_roll {value}"));
            true
        }
        fn set_max_vertical_speed(&self, value: f64) -> bool {
            self.record(format!("max_vertical_speed {value}"));
            true
        }
        fn set_max_yaw_rotation_speed(&self, value: f64) -> bool {
            self.record(format!("max_yaw {value}"));
            true
        }
        fn set_use_thrown_take_off_for_smart_take_off(&self, enabled: bool) -> bool {
            self.record(format!("thrown {enabled}"));
            true
        }
    }

    fn setup() -> (ComponentStoreCore, Arc<RecordingBackend>, ManualCopterPilotingItfCore) {
        let store = ComponentStoreCore::new();
        let backend = Arc::new(RecordingBackend::default());
        let mut core = ManualCopterPilotingItfCore::new(&store, backend.clone());
        core.publish();
        (store, backend, core)
    }

    #[test]
    fn commands_are_clamped_to_signed_percent() {
        let (store, backend, _core) = setup();
        let itf = store.get(PilotingItfs::MANUAL_COPTER).unwrap();

        itf.set_pitch(150);
        itf.set_roll(-300);
        itf.set_vertical_speed(42);

        assert_eq!(backend.calls(), vec!["pitch 100", "roll -100", "gaz 42"]);
    }

    #[test]
    fn activate_only_from_idle() {
        let (store, backend, mut core) = setup();
        assert!(!store.get(PilotingItfs::MANUAL_COPTER).unwrap().activate());

        core.update_state(ActivationState::Idle).notify_updated();
        assert!(store.get(PilotingItfs::MANUAL_COPTER).unwrap().activate());
        assert_eq!(backend.calls(), vec!["activate"]);
    }

    #[test]
    fn smart_action_prefers_land_then_thrown_take_off() {
        let (store, backend, mut core) = setup();
        let action = || {
            store
                .get(PilotingItfs::MANUAL_COPTER)
                .unwrap()
                .smart_take_off_land_action()
        };
        assert_eq!(action(), SmartTakeOffLandAction::None);

        core.update_can_take_off(true).notify_updated();
        assert_eq!(action(), SmartTakeOffLandAction::TakeOff);

        core.update_use_thrown_take_off_for_smart_take_off(true)
            .update_smart_will_thrown_take_off(true)
            .notify_updated();
        assert_eq!(action(), SmartTakeOffLandAction::ThrownTakeOff);

        core.update_can_land(true).notify_updated();
        assert_eq!(action(), SmartTakeOffLandAction::Land);

        store
            .get(PilotingItfs::MANUAL_COPTER)
            .unwrap()
            .smart_take_off_land();
        assert_eq!(backend.calls(), vec!["land"]);
    }

    #[test]
    fn max_pitch_roll_request_is_clamped_and_skips_current_value() {
        let (store, backend, mut core) = setup();
        core.update_max_pitch_roll(Some(5.0), Some(20.0), Some(35.0))
            .notify_updated();
        let itf = store.get(PilotingItfs::MANUAL_COPTER).unwrap();

        assert!(!itf.set_max_pitch_roll(20.0));
        assert!(itf.set_max_pitch_roll(90.0));

        assert_eq!(backend.calls(), vec!["max_pitch_roll 35"]);
    }

    #[test]
    fn reset_drops_optional_settings() {
        let (store, _backend, mut core) = setup();
        core.update_state(ActivationState::Active)
            .update_use_thrown_take_off_for_smart_take_off(false)
            .update_can_take_off(true)
            .notify_updated();

        core.reset().notify_updated();

        let itf = store.get(PilotingItfs::MANUAL_COPTER).unwrap();
        assert_eq!(itf.state(), ActivationState::Unavailable);
        assert_eq!(itf.use_thrown_take_off_for_smart_take_off(), None);
        assert!(!itf.can_take_off());
    }
}
