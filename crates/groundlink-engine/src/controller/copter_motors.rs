// ── Copter motors controller ──

use groundlink_core::ComponentLifecycle;
use groundlink_core::peripheral::{CopterMotor, CopterMotorsCore, MotorError};
use tracing::warn;

use super::{ComponentController, ControllerContext};
use crate::message::{FeatureMessage, SettingsStateEvent, WireMotorError};

#[derive(Debug)]
pub struct CopterMotorsController {
    motors: CopterMotorsCore,
}

impl CopterMotorsController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            motors: CopterMotorsCore::new(ctx.device.peripheral_store()),
        }
    }

    /// The state message lists every motor currently in error; motors not
    /// in `motor_ids` are error-free.
    fn on_error_state(&mut self, motor_ids: u8, error: MotorError) {
        for (bit, motor) in CopterMotor::ALL.into_iter().enumerate() {
            let error = if motor_ids & (1 << bit) == 0 {
                MotorError::NoError
            } else {
                error
            };
            self.motors.update_current_error(motor, error);
        }
        self.motors.notify_updated();
    }

    fn on_last_error(&mut self, error: MotorError) {
        for motor in CopterMotor::ALL {
            self.motors.update_past_error(motor, error);
        }
        self.motors.notify_updated();
    }
}

impl ComponentController for CopterMotorsController {
    fn did_connect(&mut self) {
        self.motors.publish();
    }

    fn did_disconnect(&mut self) {
        self.motors.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        let FeatureMessage::SettingsState(event) = message else {
            return;
        };
        match *event {
            SettingsStateEvent::MotorErrorStateChanged { motor_ids, error } => {
                if let Some(error) = motor_error(error) {
                    self.on_error_state(motor_ids, error);
                }
            }
            SettingsStateEvent::MotorErrorLastErrorChanged { error } => {
                if let Some(error) = motor_error(error) {
                    self.on_last_error(error);
                }
            }
            SettingsStateEvent::Unknown => {}
        }
    }
}

fn motor_error(error: WireMotorError) -> Option<MotorError> {
    Some(match error {
        WireMotorError::NoError => MotorError::NoError,
        WireMotorError::MotorStalled => MotorError::Stalled,
        WireMotorError::PropellerSecurity => MotorError::SecurityMode,
        WireMotorError::RcEmergencyStop => MotorError::EmergencyStop,
        WireMotorError::BatteryVoltage => MotorError::BatteryVoltage,
        WireMotorError::LipoCells => MotorError::LackOfBattery,
        WireMotorError::Temperature | WireMotorError::Mosfet => MotorError::Temperature,
        WireMotorError::Eeprom
        | WireMotorError::CommLost
        | WireMotorError::RealTime
        | WireMotorError::MotorSetting
        | WireMotorError::Bootloader
        | WireMotorError::AssertError => MotorError::Other,
        WireMotorError::Unknown => {
            warn!("unknown motor error, skipping event");
            return None;
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use groundlink_core::Peripherals;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::controller::test_support::Harness;

    #[test]
    fn error_state_and_last_error() {
        let h = Harness::new();
        let mut ctrl = CopterMotorsController::new(&h.context());
        ctrl.did_connect();

        ctrl.did_receive(&FeatureMessage::SettingsState(
            SettingsStateEvent::MotorErrorStateChanged {
                motor_ids: 0b0101,
                error: WireMotorError::Temperature,
            },
        ));
        let motors = h.device.peripheral(Peripherals::COPTER_MOTORS).unwrap();
        assert_eq!(
            motors.motors_currently_in_error(),
            vec![CopterMotor::FrontLeft, CopterMotor::RearRight]
        );

        ctrl.did_receive(&FeatureMessage::SettingsState(
            SettingsStateEvent::MotorErrorLastErrorChanged {
                error: WireMotorError::MotorStalled,
            },
        ));
        let motors = h.device.peripheral(Peripherals::COPTER_MOTORS).unwrap();
        assert_eq!(motors.latest_error(CopterMotor::FrontLeft), MotorError::Temperature);
        assert_eq!(motors.latest_error(CopterMotor::FrontRight), MotorError::Stalled);

        ctrl.did_receive(&FeatureMessage::SettingsState(
            SettingsStateEvent::MotorErrorStateChanged {
                motor_ids: 0,
                error: WireMotorError::NoError,
            },
        ));
        let motors = h.device.peripheral(Peripherals::COPTER_MOTORS).unwrap();
        assert!(motors.motors_currently_in_error().is_empty());
        assert_eq!(motors.latest_error(CopterMotor::FrontLeft), MotorError::Stalled);
    }
}
