// ── Flying indicators controller ──

use groundlink_core::ComponentLifecycle;
use groundlink_core::instrument::{FlyingIndicatorsCore, FlyingPhase, FlyingState, LandedState};
use tracing::warn;

use super::{ComponentController, ControllerContext};
use crate::message::{FeatureMessage, PilotingStateEvent, WireFlyingState};

#[derive(Debug)]
pub struct FlyingIndicatorsController {
    indicators: FlyingIndicatorsCore,
}

impl FlyingIndicatorsController {
    pub fn new(ctx: &ControllerContext<'_>) -> Self {
        Self {
            indicators: FlyingIndicatorsCore::new(ctx.device.instrument_store()),
        }
    }

    fn on_flying_state(&mut self, state: WireFlyingState) {
        let indicators = &mut self.indicators;
        let updated = match state {
            WireFlyingState::Landed => indicators.update_landed_state(LandedState::Idle),
            WireFlyingState::MotorRamping => {
                indicators.update_landed_state(LandedState::MotorRamping)
            }
            WireFlyingState::UserTakeOff => {
                indicators.update_landed_state(LandedState::WaitingUserAction)
            }
            WireFlyingState::TakingOff => indicators.update_flying_state(FlyingPhase::TakingOff),
            WireFlyingState::Hovering => indicators.update_flying_state(FlyingPhase::Waiting),
            WireFlyingState::Flying => indicators.update_flying_state(FlyingPhase::Flying),
            WireFlyingState::Landing => indicators.update_flying_state(FlyingPhase::Landing),
            WireFlyingState::Emergency => indicators.update_state(FlyingState::Emergency),
            WireFlyingState::EmergencyLanding => {
                indicators.update_state(FlyingState::EmergencyLanding)
            }
            WireFlyingState::Unknown => {
                warn!("unknown flying state, skipping event");
                return;
            }
        };
        updated.notify_updated();
    }
}

impl ComponentController for FlyingIndicatorsController {
    fn did_connect(&mut self) {
        self.indicators.publish();
    }

    fn did_disconnect(&mut self) {
        self.indicators.unpublish();
    }

    fn did_receive(&mut self, message: &FeatureMessage) {
        if let FeatureMessage::PilotingState(PilotingStateEvent::FlyingStateChanged { state }) =
            message
        {
            self.on_flying_state(*state);
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

    fn feed(ctrl: &mut FlyingIndicatorsController, state: WireFlyingState) {
        ctrl.did_receive(&FeatureMessage::PilotingState(
            PilotingStateEvent::FlyingStateChanged { state },
        ));
    }

    #[test]
    fn wire_states_map_to_indicators() {
        let h = Harness::new();
        let mut ctrl = FlyingIndicatorsController::new(&h.context());
        ctrl.did_connect();
        let current = || {
            let fi = h.device.instrument(Instruments::FLYING_INDICATORS).unwrap();
            (fi.state(), fi.landed_state(), fi.flying_state())
        };

        feed(&mut ctrl, WireFlyingState::MotorRamping);
        assert_eq!(
            current(),
            (FlyingState::Landed, LandedState::MotorRamping, FlyingPhase::None)
        );

        feed(&mut ctrl, WireFlyingState::TakingOff);
        assert_eq!(
            current(),
            (FlyingState::Flying, LandedState::None, FlyingPhase::TakingOff)
        );

        feed(&mut ctrl, WireFlyingState::Hovering);
        assert_eq!(
            current(),
            (FlyingState::Flying, LandedState::None, FlyingPhase::Waiting)
        );

        feed(&mut ctrl, WireFlyingState::EmergencyLanding);
        assert_eq!(
            current(),
            (FlyingState::EmergencyLanding, LandedState::None, FlyingPhase::None)
        );

        feed(&mut ctrl, WireFlyingState::Unknown);
        assert_eq!(
            current(),
            (FlyingState::EmergencyLanding, LandedState::None, FlyingPhase::None)
        );
    }
}
