// ── GPS controller ──
//
// Last known location and accuracies are persisted per device, so with
// offline settings enabled a known device shows its last position while
// disconnected.

use chrono::{DateTime, Utc};
use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::GpsCore;
use tracing::debug;

use super::{ComponentController, ControllerContext};
use crate::message::{
    FeatureMessage, GpsSettingsStateEvent, GpsStateEvent, PilotingStateEvent, UNKNOWN_COORDINATE,
};
use crate::settings::SettingsStore;

const SETTINGS_KEY: &str = "Gps";

const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";
const ALTITUDE: &str = "altitude";
const HORIZONTAL_ACCURACY: &str = "horizontalAccuracy";
const VERTICAL_ACCURACY: &str = "verticalAccuracy";
const LOCATION_TIME: &str = "locationTime";

#[derive(Debug)]
pub struct GpsController {
    gps: GpsCore,
    settings: SettingsStore,
    offline_settings: bool,
    /// Once a `GpsLocationChanged` arrives, legacy position reports are
    /// ignored.
    use_gps_location: bool,
}

impl GpsController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        let mut ctrl = Self {
            gps: GpsCore::new(ctx.device.instrument_store()),
            settings: ctx.settings.child(SETTINGS_KEY),
            offline_settings: ctx.config.offline_settings,
            use_gps_location: false,
        };
        if ctrl.keeps_offline() {
            ctrl.load_persisted();
            ctrl.gps.publish();
        }
        ctrl
    }

    fn keeps_offline(&self) -> bool {
        self.offline_settings && !self.settings.is_new()
    }

    fn load_persisted(&mut self) {
        let s = &self.settings;
        if let (Some(latitude), Some(longitude), Some(altitude), Some(time)) = (
            s.read::<f64>(LATITUDE),
            s.read::<f64>(LONGITUDE),
            s.read::<f64>(ALTITUDE),
            s.read::<DateTime<Utc>>(LOCATION_TIME),
        ) {
            self.gps.update_location(latitude, longitude, altitude, time);
        }
        if let Some(accuracy) = s.read::<f64>(HORIZONTAL_ACCURACY) {
            self.gps.update_horizontal_accuracy(accuracy);
        }
        if let Some(accuracy) = s.read::<f64>(VERTICAL_ACCURACY) {
            self.gps.update_vertical_accuracy(accuracy);
        }
        debug!("loaded persisted gps location");
    }

    fn save_location(&self, latitude: f64, longitude: f64, altitude: f64, time: DateTime<Utc>) {
        self.settings
            .write(LATITUDE, &latitude)
            .write(LONGITUDE, &longitude)
            .write(ALTITUDE, &altitude)
            .write(LOCATION_TIME, &time)
            .commit();
    }

    fn on_piloting_state(&mut self, event: &PilotingStateEvent) {
        match *event {
            PilotingStateEvent::PositionChanged {
                latitude,
                longitude,
                altitude,
            } => {
                if self.use_gps_location || !is_known(latitude, longitude) {
                    return;
                }
                let now = Utc::now();
                self.gps
                    .update_location(latitude, longitude, altitude, now)
                    .notify_updated();
                self.save_location(latitude, longitude, altitude, now);
            }
            PilotingStateEvent::GpsLocationChanged {
                latitude,
                longitude,
                altitude,
                latitude_accuracy,
                longitude_accuracy,
                altitude_accuracy,
            } => {
                self.use_gps_location = true;
                if !is_known(latitude, longitude) {
                    return;
                }
                let now = Utc::now();
                let horizontal = f64::from(latitude_accuracy.max(longitude_accuracy));
                let vertical = f64::from(altitude_accuracy);
                self.gps
                    .update_location(latitude, longitude, altitude, now)
                    .update_horizontal_accuracy(horizontal)
                    .update_vertical_accuracy(vertical)
                    .notify_updated();
                self.settings
                    .write(HORIZONTAL_ACCURACY, &horizontal)
                    .write(VERTICAL_ACCURACY, &vertical);
                self.save_location(latitude, longitude, altitude, now);
            }
            _ => {}
        }
    }
}

impl ComponentController for GpsController {
    fn did_connect(&mut self) {
        self.gps.publish();
    }

    fn did_disconnect(&mut self) {
        self.gps
            .update_fixed(false)
            .update_satellite_count(0)
            .notify_updated();
        if !self.keeps_offline() {
            self.gps.unpublish();
        }
    }

    fn will_forget(&mut self) {
        self.settings.clear();
        self.gps.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        match message {
            FeatureMessage::PilotingState(event) => self.on_piloting_state(event),
            FeatureMessage::GpsSettingsState(GpsSettingsStateEvent::GpsFixStateChanged {
                fixed,
            }) => {
                // Satellite counts are not re-sent without a fix.
                if !fixed {
                    self.gps.update_satellite_count(0);
                }
                self.gps.update_fixed(*fixed).notify_updated();
            }
            FeatureMessage::GpsState(GpsStateEvent::NumberOfSatelliteChanged { count }) => {
                self.gps.update_satellite_count(*count).notify_updated();
            }
            _ => {}
        }
    }
}

fn is_known(latitude: f64, longitude: f64) -> bool {
    latitude != UNKNOWN_COORDINATE && longitude != UNKNOWN_COORDINATE
}
