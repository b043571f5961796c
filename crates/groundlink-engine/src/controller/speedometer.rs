// ── Speedometer controller ──
//
// Forward/right speeds are the NED ground speed rotated by the last known
// heading, so both speed and attitude reports refresh them.

use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::SpeedometerCore;

use super::{ComponentController, ControllerContext};
use crate::message::{FeatureMessage, PilotingStateEvent};

#[derive(Debug)]
pub struct SpeedometerController {
    speedometer: SpeedometerCore,
    north: f64,
    east: f64,
    /// Heading in radians.
    yaw: f64,
}

impl SpeedometerController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            speedometer: SpeedometerCore::new(ctx.device.instrument_store()),
            north: 0.0,
            east: 0.0,
            yaw: 0.0,
        }
    }

    fn update_relative_speeds(&mut self) -> &mut SpeedometerCore {
        let (sin, cos) = self.yaw.sin_cos();
        self.speedometer
            .update_forward_speed(self.north * cos + self.east * sin)
            .update_right_speed(-self.north * sin + self.east * cos)
    }
}

impl ComponentController for SpeedometerController {
    fn did_connect(&mut self) {
        self.speedometer.publish();
    }

    fn did_disconnect(&mut self) {
        self.speedometer.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        let FeatureMessage::PilotingState(event) = message else {
            return;
        };
        match *event {
            PilotingStateEvent::SpeedChanged {
                speed_x,
                speed_y,
                speed_z,
            } => {
                self.north = speed_x;
                self.east = speed_y;
                self.update_relative_speeds()
                    .update_ground_speed(speed_x.hypot(speed_y))
                    .update_north_speed(speed_x)
                    .update_east_speed(speed_y)
                    .update_down_speed(speed_z)
                    .notify_updated();
            }
            PilotingStateEvent::AttitudeChanged { yaw, .. } => {
                self.yaw = yaw;
                self.update_relative_speeds().notify_updated();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use groundlink_core::Instruments;

    use super::*;
    use crate::controller::test_support::Harness;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn speeds_follow_heading() {
        let h = Harness::new();
        let mut ctrl = SpeedometerController::new(&h.context());
        ctrl.did_connect();

        ctrl.did_receive(&FeatureMessage::PilotingState(
            PilotingStateEvent::SpeedChanged {
                speed_x: 3.0,
                speed_y: 4.0,
                speed_z: 0.5,
            },
        ));
        let speed = h.device.instrument(Instruments::SPEEDOMETER).unwrap();
        assert!(close(speed.ground_speed, 5.0));
        assert!(close(speed.forward_speed, 3.0));
        assert!(close(speed.right_speed, 4.0));
        assert!(close(speed.down_speed, 0.5));

        // Facing east: eastward motion is forward, northward is to the left.
        ctrl.did_receive(&FeatureMessage::PilotingState(
            PilotingStateEvent::AttitudeChanged {
                roll: 0.0,
                pitch: 0.0,
                yaw: FRAC_PI_2,
            },
        ));
        let speed = h.device.instrument(Instruments::SPEEDOMETER).unwrap();
        assert!(close(speed.forward_speed, 4.0));
        assert!(close(speed.right_speed, -3.0));
    }
}
