// ── Instruments ──
//
// Read-only telemetry components published in a device's instrument store.

mod alarms;
mod altimeter;
mod battery_info;
mod flying_indicators;
mod gps;
mod speedometer;

pub use alarms::{Alarm, AlarmKind, AlarmLevel, Alarms, AlarmsCore};
pub use altimeter::{Altimeter, AltimeterCore};
pub use battery_info::{BatteryInfo, BatteryInfoCore};
pub use flying_indicators::{
    FlyingIndicators, FlyingIndicatorsCore, FlyingPhase, FlyingState, LandedState,
};
pub use gps::{Gps, GpsCore, Location};
pub use speedometer::{Speedometer, SpeedometerCore};
