// ── Copter motors peripheral ──

use serde::Serialize;

use crate::component::{
    Component, ComponentCore, ComponentLifecycle, ComponentUid, Peripheral, Peripherals,
};
use crate::store::ComponentStoreCore;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CopterMotor {
    FrontLeft,
    FrontRight,
    RearRight,
    RearLeft,
}

impl CopterMotor {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [
        Self::FrontLeft,
        Self::FrontRight,
        Self::RearRight,
        Self::RearLeft,
    ];

    #[allow(clippy::as_conversions)]
    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MotorError {
    NoError,
    Stalled,
    SecurityMode,
    EmergencyStop,
    BatteryVoltage,
    LackOfBattery,
    Temperature,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopterMotors {
    current: [MotorError; CopterMotor::COUNT],
    past: [MotorError; CopterMotor::COUNT],
}

impl Default for CopterMotors {
    fn default() -> Self {
        Self {
            current: [MotorError::NoError; CopterMotor::COUNT],
            past: [MotorError::NoError; CopterMotor::COUNT],
        }
    }
}

impl CopterMotors {
    pub fn current_error(&self, motor: CopterMotor) -> MotorError {
        self.current[motor.index()]
    }

    /// Current error if any, otherwise the last error the motor reported.
    pub fn latest_error(&self, motor: CopterMotor) -> MotorError {
        match self.current[motor.index()] {
            MotorError::NoError => self.past[motor.index()],
            error => error,
        }
    }

    pub fn motors_currently_in_error(&self) -> Vec<CopterMotor> {
        CopterMotor::ALL
            .into_iter()
            .filter(|motor| self.current[motor.index()] != MotorError::NoError)
            .collect()
    }
}

impl Component for CopterMotors {
    fn uid(&self) -> ComponentUid {
        Peripherals::COPTER_MOTORS.uid()
    }
}

impl Peripheral for CopterMotors {}

#[derive(Debug)]
pub struct CopterMotorsCore {
    core: ComponentCore<CopterMotors>,
}

impl CopterMotorsCore {
    pub fn new(store: &ComponentStoreCore) -> Self {
        Self {
            core: ComponentCore::new(store, CopterMotors::default()),
        }
    }

    pub fn update_current_error(&mut self, motor: CopterMotor, error: MotorError) -> &mut Self {
        self.core
            .update_field(|m| &mut m.current[motor.index()], error);
        self
    }

    /// Past errors are always recorded but only count as a change while the
    /// motor has no current error, since the current one masks them.
    pub fn update_past_error(&mut self, motor: CopterMotor, error: MotorError) -> &mut Self {
        self.core.edit(|m| {
            let slot = &mut m.past[motor.index()];
            if *slot == error {
                return false;
            }
            *slot = error;
            m.current[motor.index()] == MotorError::NoError
        });
        self
    }
}

impl ComponentLifecycle for CopterMotorsCore {
    type Snapshot = CopterMotors;

    fn core(&self) -> &ComponentCore<CopterMotors> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore<CopterMotors> {
        &mut self.core
    }
}
