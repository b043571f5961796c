// ── Altimeter instrument ──

use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

/// Altitudes in meters, vertical speed in m/s (positive up).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Altimeter {
    pub take_off_relative_altitude: Option<f64>,
    pub ground_relative_altitude: Option<f64>,
    pub absolute_altitude: Option<f64>,
    pub vertical_speed: Option<f64>,
}

impl Component for Altimeter {
    fn uid(&self) -> ComponentUid {
        Instruments::ALTIMETER.uid()
    }
}

impl Instrument for Altimeter {}

#[derive(Debug)]
pub struct AltimeterCore {
    core: ComponentCore<Altimeter>,
}

impl AltimeterCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, Altimeter::default()),
        }
    }

    pub fn update_take_off_relative_altitude(&mut self, value: Option<f64>) -> &mut Self {
        self.core
            .update_field(|a| &mut a.take_off_relative_altitude, value);
        self
    }

    pub fn update_ground_relative_altitude(&mut self, value: Option<f64>) -> &mut Self {
        self.core
            .update_field(|a| &mut a.ground_relative_altitude, value);
        self
    }

    pub fn update_absolute_altitude(&mut self, value: Option<f64>) -> &mut Self {
        self.core.update_field(|a| &mut a.absolute_altitude, value);
        self
    }

    pub fn update_vertical_speed(&mut self, value: Option<f64>) -> &mut Self {
        self.core.update_field(|a| &mut a.vertical_speed, value);
        self
    }
}

impl ComponentLifecycle for AltimeterCore {
    type Snapshot = Altimeter;

    fn core(&self) -> &ComponentCore<Altimeter> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<Altimeter> {
        &mut self.core
    }
}
