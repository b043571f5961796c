// ── Altimeter controller ──

use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::AltimeterCore;

use super::{ComponentController, ControllerContext};
use crate::message::{FeatureMessage, PilotingStateEvent, UNKNOWN_COORDINATE};

#[derive(Debug)]
pub struct AltimeterController {
    altimeter: AltimeterCore,
}

impl AltimeterController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            altimeter: AltimeterCore::new(ctx.device.instrument_store()),
        }
    }
}

impl ComponentController for AltimeterController {
    fn did_connect(&mut self) {
        self.altimeter.publish();
    }

    fn did_disconnect(&mut self) {
        self.altimeter.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        let FeatureMessage::PilotingState(event) = message else {
            return;
        };
        match *event {
            PilotingStateEvent::AltitudeChanged { altitude } => {
                self.altimeter
                    .update_take_off_relative_altitude(Some(altitude))
                    .notify_updated();
            }
            PilotingStateEvent::AltitudeAboveGroundChanged { altitude } => {
                self.altimeter
                    .update_ground_relative_altitude(Some(altitude))
                    .notify_updated();
            }
            PilotingStateEvent::GpsLocationChanged {
                latitude,
                longitude,
                altitude,
                ..
            } => {
                if latitude != UNKNOWN_COORDINATE && longitude != UNKNOWN_COORDINATE {
                    self.altimeter
                        .update_absolute_altitude(Some(altitude))
                        .notify_updated();
                }
            }
            // NED down speed, reported as climb rate.
            PilotingStateEvent::SpeedChanged { speed_z, .. } => {
                self.altimeter
                    .update_vertical_speed(Some(-speed_z))
                    .notify_updated();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use groundlink_core::Instruments;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::controller::test_support::Harness;

    #[test]
    fn altitudes_and_climb_rate() {
        let h = Harness::new();
        let mut ctrl = AltimeterController::new(&h.context());
        ctrl.did_connect();

        for event in [
            PilotingStateEvent::AltitudeChanged { altitude: 12.5 },
            PilotingStateEvent::AltitudeAboveGroundChanged { altitude: 11.0 },
            PilotingStateEvent::SpeedChanged {
                speed_x: 1.0,
                speed_y: 0.0,
                speed_z: -2.0,
            },
        ] {
            ctrl.did_receive(&FeatureMessage::PilotingState(event));
        }

        let altimeter = h.device.instrument(Instruments::ALTIMETER).unwrap();
        assert_eq!(altimeter.take_off_relative_altitude, Some(12.5));
        assert_eq!(altimeter.ground_relative_altitude, Some(11.0));
        assert_eq!(altimeter.vertical_speed, Some(2.0));
        assert_eq!(altimeter.absolute_altitude, None);
    }

    #[test]
    fn absolute_altitude_needs_known_position() {
        let h = Harness::new();
        let mut ctrl = AltimeterController::new(&h.context());
        ctrl.did_connect();

        let location = |latitude| {
            FeatureMessage::PilotingState(PilotingStateEvent::GpsLocationChanged {
                latitude,
                longitude: 2.0,
                altitude: 130.0,
                latitude_accuracy: 1,
                longitude_accuracy: 1,
                altitude_accuracy: 1,
            })
        };
        ctrl.did_receive(&location(UNKNOWN_COORDINATE));
        assert_eq!(
            h.device
                .instrument(Instruments::ALTIMETER)
                .unwrap()
                .absolute_altitude,
            None
        );

        ctrl.did_receive(&location(48.0));
        assert_eq!(
            h.device
                .instrument(Instruments::ALTIMETER)
                .unwrap()
                .absolute_altitude,
            Some(130.0)
        );
    }
}
