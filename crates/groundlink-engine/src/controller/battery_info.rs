// ── Battery info controller ──

use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::BatteryInfoCore;

use super::{ComponentController, ControllerContext};
use crate::message::{BatteryEvent, CommonStateEvent, FeatureMessage};

#[derive(Debug)]
pub struct BatteryInfoController {
    battery: BatteryInfoCore,
}

impl BatteryInfoController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            battery: BatteryInfoCore::new(ctx.device.instrument_store()),
        }
    }
}

impl ComponentController for BatteryInfoController {
    fn did_connect(&mut self) {
        self.battery.publish();
    }

    fn did_disconnect(&mut self) {
        self.battery.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        match message {
            FeatureMessage::CommonState(CommonStateEvent::BatteryStateChanged { percent }) => {
                self.battery.update_level(*percent).notify_updated();
            }
            FeatureMessage::CommonState(CommonStateEvent::ChargingStateChanged { charging }) => {
                self.battery.update_is_charging(*charging).notify_updated();
            }
            FeatureMessage::Battery(BatteryEvent::Health { state_of_health }) => {
                self.battery
                    .update_health(Some(*state_of_health))
                    .notify_updated();
            }
            FeatureMessage::Battery(BatteryEvent::CycleCount { count }) => {
                self.battery.update_cycle_count(Some(*count)).notify_updated();
            }
            FeatureMessage::Battery(BatteryEvent::Serial { serial }) => {
                self.battery.update_serial(serial.as_str()).notify_updated();
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
    fn battery_fields() {
        let h = Harness::new();
        let mut ctrl = BatteryInfoController::new(&h.context());
        ctrl.did_connect();

        ctrl.did_receive(&FeatureMessage::CommonState(
            CommonStateEvent::BatteryStateChanged { percent: 87 },
        ));
        ctrl.did_receive(&FeatureMessage::Battery(BatteryEvent::Health {
            state_of_health: 96,
        }));
        ctrl.did_receive(&FeatureMessage::Battery(BatteryEvent::Serial {
            serial: "BAT-0042".into(),
        }));

        let battery = h.device.instrument(Instruments::BATTERY_INFO).unwrap();
        assert_eq!(battery.level, 87);
        assert_eq!(battery.health, Some(96));
        assert_eq!(battery.serial.as_deref(), Some("BAT-0042"));
        assert_eq!(battery.cycle_count, None);

        ctrl.did_disconnect();
        assert!(h.device.instrument(Instruments::BATTERY_INFO).is_none());
    }
}
