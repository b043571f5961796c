// ── Piloting interfaces ──
//
// Components through which an application flies a device. At most one
// interface is active at a time; the others are idle or unavailable.

mod manual_copter;

use serde::Serialize;

pub use manual_copter::{
    ManualCopterBackend, ManualCopterPilotingItf, ManualCopterPilotingItfCore,
    SmartTakeOffLandAction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivationState {
    /// Cannot be activated in the current device state.
    Unavailable,
    /// Can be activated.
    Idle,
    Active,
}

/// Numeric setting with device-provided bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DoubleSetting {
    pub min: f64,
    pub value: f64,
    pub max: f64,
}

impl DoubleSetting {
    /// Applies whichever parts are given. Returns whether anything changed.
    pub fn update(&mut self, min: Option<f64>, value: Option<f64>, max: Option<f64>) -> bool {
        let before = *self;
        if let Some(min) = min {
            self.min = min;
        }
        if let Some(max) = max {
            self.max = max;
        }
        if let Some(value) = value {
            self.value = value;
        }
        *self != before
    }

    /// Clamps a requested value into the current bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.min <= self.max {
            value.clamp(self.min, self.max)
        } else {
            value
        }
    }
}
