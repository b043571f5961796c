// ── Battery info instrument ──

use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatteryInfo {
    /// Charge level, percent.
    pub level: u8,
    pub is_charging: bool,
    /// State of health, percent.
    pub health: Option<u8>,
    pub cycle_count: Option<u32>,
    pub serial: Option<String>,
}

impl Component for BatteryInfo {
    fn uid(&self) -> ComponentUid {
        Instruments::BATTERY_INFO.uid()
    }
}

impl Instrument for BatteryInfo {}

#[derive(Debug)]
pub struct BatteryInfoCore {
    core: ComponentCore<BatteryInfo>,
}

impl BatteryInfoCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, BatteryInfo::default()),
        }
    }

    pub fn update_level(&mut self, level: u8) -> &mut Self {
        self.core.update_field(|b| &mut b.level, level.min(100));
        self
    }

    pub fn update_is_charging(&mut self, charging: bool) -> &mut Self {
        self.core.update_field(|b| &mut b.is_charging, charging);
        self
    }

    pub fn update_health(&mut self, health: Option<u8>) -> &mut Self {
        self.core
            .update_field(|b| &mut b.health, health.map(|h| h.min(100)));
        self
    }

    pub fn update_cycle_count(&mut self, count: Option<u32>) -> &mut Self {
        self.core.update_field(|b| &mut b.cycle_count, count);
        self
    }

    pub fn update_serial(&mut self, serial: impl Into<String>) -> &mut Self {
        self.core.update_field(|b| &mut b.serial, Some(serial.into()));
        self
    }
}

impl ComponentLifecycle for BatteryInfoCore {
    type Snapshot = BatteryInfo;

    fn core(&self) -> &ComponentCore<BatteryInfo> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<BatteryInfo> {
        &mut self.core
    }
}
