// ── Speedometer instrument ──

use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

/// Speeds in m/s. North/east/down are in the NED frame; forward/right are
/// relative to the drone heading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Speedometer {
    pub ground_speed: f64,
    pub north_speed: f64,
    pub east_speed: f64,
    pub down_speed: f64,
    pub forward_speed: f64,
    pub right_speed: f64,
}

impl Component for Speedometer {
    fn uid(&self) -> ComponentUid {
        Instruments::SPEEDOMETER.uid()
    }
}

impl Instrument for Speedometer {}

#[derive(Debug)]
pub struct SpeedometerCore {
    core: ComponentCore<Speedometer>,
}

impl SpeedometerCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, Speedometer::default()),
        }
    }

    pub fn update_ground_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.ground_speed, value);
        self
    }

    pub fn update_north_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.north_speed, value);
        self
    }

    pub fn update_east_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.east_speed, value);
        self
    }

    pub fn update_down_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.down_speed, value);
        self
    }

    pub fn update_forward_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.forward_speed, value);
        self
    }

    pub fn update_right_speed(&mut self, value: f64) -> &mut Self {
        self.core.update_field(|s| &mut s.right_speed, value);
        self
    }
}

impl ComponentLifecycle for SpeedometerCore {
    type Snapshot = Speedometer;

    fn core(&self) -> &ComponentCore<Speedometer> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<Speedometer> {
        &mut self.core
    }
}
