// ── Flying indicators instrument ──
//
// Three linked fields: the main state and one detail state for each of the
// landed and flying phases. A detail state is `None` whenever the main
// state is not its phase.

use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Instrument, Instruments,
};
use crate::store::ComponentStoreCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlyingState {
    Landed,
    Flying,
    EmergencyLanding,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LandedState {
    None,
    Initializing,
    Idle,
    MotorRamping,
    WaitingUserAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlyingPhase {
    None,
    TakingOff,
    Landing,
    Waiting,
    Flying,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlyingIndicators {
    state: FlyingState,
    landed_state: LandedState,
    flying_state: FlyingPhase,
}

impl Default for FlyingIndicators {
    fn default() -> Self {
        Self {
            state: FlyingState::Landed,
            landed_state: LandedState::Initializing,
            flying_state: FlyingPhase::None,
        }
    }
}

impl FlyingIndicators {
    pub fn state(&self) -> FlyingState {
        self.state
    }

    pub fn landed_state(&self) -> LandedState {
        self.landed_state
    }

    pub fn flying_state(&self) -> FlyingPhase {
        self.flying_state
    }
}

impl Component for FlyingIndicators {
    fn uid(&self) -> ComponentUid {
        Instruments::FLYING_INDICATORS.uid()
    }
}

impl Instrument for FlyingIndicators {}

#[derive(Debug)]
pub struct FlyingIndicatorsCore {
    core: ComponentCore<FlyingIndicators>,
}

impl FlyingIndicatorsCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, FlyingIndicators::default()),
        }
    }

    /// Changing the main state resets the detail state of any phase it
    /// leaves.
    pub fn update_state(&mut self, state: FlyingState) -> &mut Self {
        self.core.edit(|fi| {
            if fi.state == state {
                return false;
            }
            fi.state = state;
            if state != FlyingState::Flying {
                fi.flying_state = FlyingPhase::None;
            }
            if state != FlyingState::Landed {
                fi.landed_state = LandedState::None;
            }
            true
        });
        self
    }

    /// A landed detail other than `None` forces the main state to landed.
    pub fn update_landed_state(&mut self, landed_state: LandedState) -> &mut Self {
        if landed_state != LandedState::None {
            self.update_state(FlyingState::Landed);
        }
        self.core
            .update_field(|fi| &mut fi.landed_state, landed_state);
        self
    }

    /// A flying detail other than `None` forces the main state to flying.
    pub fn update_flying_state(&mut self, flying_state: FlyingPhase) -> &mut Self {
        if flying_state != FlyingPhase::None {
            self.update_state(FlyingState::Flying);
        }
        self.core
            .update_field(|fi| &mut fi.flying_state, flying_state);
        self
    }
}

impl ComponentLifecycle for FlyingIndicatorsCore {
    type Snapshot = FlyingIndicators;

    fn core(&self) -> &ComponentCore<FlyingIndicators> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<FlyingIndicators> {
        &mut self.core
    }
}
