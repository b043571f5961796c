// ── GPS instrument ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

/// Last known position, with the time it was received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Published GPS snapshot. Accuracies are `-1.0` when unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gps {
    fixed: bool,
    last_known_location: Option<Location>,
    horizontal_accuracy: f64,
    vertical_accuracy: f64,
    satellite_count: u32,
}

impl Default for Gps {
    fn default() -> Self {
        Self {
            fixed: false,
            last_known_location: None,
            horizontal_accuracy: -1.0,
            vertical_accuracy: -1.0,
            satellite_count: 0,
        }
    }
}

impl Gps {
    pub fn fixed(&self) -> bool {
        self.fixed
    }

    pub fn last_known_location(&self) -> Option<&Location> {
        self.last_known_location.as_ref()
    }

    /// Horizontal accuracy in meters, if known.
    pub fn horizontal_accuracy(&self) -> Option<f64> {
        (self.horizontal_accuracy >= 0.0).then_some(self.horizontal_accuracy)
    }

    /// Vertical accuracy in meters, if known.
    pub fn vertical_accuracy(&self) -> Option<f64> {
        (self.vertical_accuracy >= 0.0).then_some(self.vertical_accuracy)
    }

    pub fn satellite_count(&self) -> u32 {
        self.satellite_count
    }
}

impl Component for Gps {
    fn uid(&self) -> ComponentUid {
        Instruments::GPS.uid()
    }
}

impl Instrument for Gps {}

#[derive(Debug)]
pub struct GpsCore {
    core: ComponentCore<Gps>,
}

impl GpsCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, Gps::default()),
        }
    }

    pub fn update_fixed(&mut self, fixed: bool) -> &mut Self {
        self.core.update_field(|g| &mut g.fixed, fixed);
        self
    }

    /// Latitude, longitude and altitude change together. The timestamp is
    /// only taken when the position itself moved.
    pub fn update_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        timestamp: DateTime<Utc>,
    ) -> &mut Self {
        self.core.edit(|gps| {
            let moved = gps.last_known_location.is_none_or(|l| {
                l.latitude != latitude || l.longitude != longitude || l.altitude != altitude
            });
            if moved {
                gps.last_known_location = Some(Location {
                    latitude,
                    longitude,
                    altitude,
                    timestamp,
                });
            }
            moved
        });
        self
    }

    pub fn update_horizontal_accuracy(&mut self, accuracy: f64) -> &mut Self {
        self.core
            .update_field(|g| &mut g.horizontal_accuracy, accuracy);
        self
    }

    pub fn update_vertical_accuracy(&mut self, accuracy: f64) -> &mut Self {
        self.core.update_field(|g| &mut g.vertical_accuracy, accuracy);
        self
    }

    pub fn update_satellite_count(&mut self, count: u32) -> &mut Self {
        self.core.update_field(|g| &mut g.satellite_count, count);
        self
    }
}

impl ComponentLifecycle for GpsCore {
    type Snapshot = Gps;

    fn core(&self) -> &ComponentCore<Gps> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<Gps> {
        &mut self.core
    }
}
