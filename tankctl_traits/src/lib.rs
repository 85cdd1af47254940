//! Hardware-facing seams for the tankctl control stack.
//!
//! Everything that touches a sensor, an actuator or the passage of time is a
//! trait here so `tankctl_core` stays hardware-agnostic. Reads and writes are
//! infallible at this boundary: a faulty device reports stale or zero values
//! instead of failing the call.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A source of scalar readings for a control loop (encoder, potentiometer, ultrasonic...).
pub trait ControllerInput {
    fn controller_get(&mut self) -> f64;
}

/// A sink for normalised control outputs in `[-1.0, 1.0]`.
pub trait ControllerOutput {
    fn controller_set(&mut self, value: f64);
}

/// Motor cartridge. Determines the free speed and the internal encoder resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gearset {
    /// 36:1, 100 rpm
    Red,
    /// 18:1, 200 rpm
    #[default]
    Green,
    /// 6:1, 600 rpm
    Blue,
}

impl Gearset {
    pub const fn max_rpm(self) -> i32 {
        match self {
            Gearset::Red => 100,
            Gearset::Green => 200,
            Gearset::Blue => 600,
        }
    }

    /// Encoder counts per output shaft revolution.
    pub const fn ticks_per_rev(self) -> i32 {
        match self {
            Gearset::Red => 1800,
            Gearset::Green => 900,
            Gearset::Blue => 300,
        }
    }
}

/// Units a motor reports its position in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderUnits {
    #[default]
    Degrees,
    Rotations,
    Counts,
}

/// A motor with its own built-in position loop.
pub trait PositionMotor {
    /// Command an absolute position (in the motor's encoder units) at up to `velocity` rpm.
    fn move_absolute(&mut self, position: f64, velocity: i32);
    /// Command a velocity in rpm. `0` holds the motor.
    fn move_velocity(&mut self, velocity: i32);
    /// Current position in encoder units.
    fn position(&self) -> f64;
    fn gearing(&self) -> Gearset;
}

/// Absolute encoder readings of both drivetrain sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorVals {
    pub left: f64,
    pub right: f64,
}

/// Actuator and sensor access for a differential chassis.
pub trait ChassisModel {
    fn sensor_vals(&self) -> SensorVals;
    fn reset_sensors(&mut self);
    /// Halt both sides.
    fn stop(&mut self);
    /// Open-loop tank drive, both arguments in `[-1.0, 1.0]`.
    fn tank(&mut self, left: f64, right: f64);
    /// Open-loop arcade drive, both arguments in `[-1.0, 1.0]`.
    fn arcade(&mut self, forward: f64, yaw: f64);
    fn set_gearing(&mut self, gearset: Gearset);
    fn set_encoder_units(&mut self, units: EncoderUnits);

    fn forward(&mut self, speed: f64) {
        self.tank(speed, speed);
    }

    fn rotate(&mut self, speed: f64) {
        self.tank(speed, -speed);
    }
}
