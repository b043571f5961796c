// ── Peripherals ──

mod copter_motors;

pub use copter_motors::{CopterMotor, CopterMotors, CopterMotorsCore, MotorError};
