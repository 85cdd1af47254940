//! Differential-drive chassis control in physical units.

pub mod integrated;
pub mod scales;

pub use integrated::ChassisControllerIntegrated;
pub use scales::ChassisScales;

use tankctl_traits::Gearset;

use crate::units::{DEGREE, METER, QAngle, QLength};

/// Where a chassis controller is in its move lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChassisState {
    #[default]
    Idle,
    /// A target is active and at least one side has not settled.
    Moving,
    /// Both sides settled; drops to `Idle` once the motors are released.
    Settled,
}

/// Motor cartridge plus any external gearing between motor and wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearsetRatioPair {
    pub internal: Gearset,
    /// Wheel-side output ratio, e.g. `36.0 / 60.0`.
    pub ratio: f64,
}

impl GearsetRatioPair {
    pub fn new(internal: Gearset, ratio: f64) -> Self {
        Self { internal, ratio }
    }
}

impl From<Gearset> for GearsetRatioPair {
    fn from(internal: Gearset) -> Self {
        Self::new(internal, 1.0)
    }
}

/// Distance and angle moves for a chassis.
///
/// The `_raw` variants take the target in motor degrees and are thin wrappers
/// over the physical-unit methods.
pub trait ChassisController {
    /// Start a straight move and return immediately.
    fn move_distance_async(&mut self, target: QLength);
    /// Start a point turn and return immediately. Positive turns clockwise.
    fn turn_angle_async(&mut self, target: QAngle);
    /// Block until both sides have settled, then release the motors.
    fn wait_until_settled(&mut self);
    /// Disable closed-loop control and stop the chassis.
    fn stop(&mut self);
    /// Non-blocking settle check.
    fn is_settled(&mut self) -> bool;
    fn state(&self) -> ChassisState;
    fn straight_scale(&self) -> f64;
    fn turn_scale(&self) -> f64;

    fn move_distance(&mut self, target: QLength) {
        self.move_distance_async(target);
        self.wait_until_settled();
    }

    fn move_distance_raw(&mut self, motor_degrees: f64) {
        let target = (motor_degrees / self.straight_scale()) * METER;
        self.move_distance(target);
    }

    fn move_distance_raw_async(&mut self, motor_degrees: f64) {
        let target = (motor_degrees / self.straight_scale()) * METER;
        self.move_distance_async(target);
    }

    fn turn_angle(&mut self, target: QAngle) {
        self.turn_angle_async(target);
        self.wait_until_settled();
    }

    fn turn_angle_raw(&mut self, motor_degrees: f64) {
        let target = (motor_degrees / self.turn_scale()) * DEGREE;
        self.turn_angle(target);
    }

    fn turn_angle_raw_async(&mut self, motor_degrees: f64) {
        let target = (motor_degrees / self.turn_scale()) * DEGREE;
        self.turn_angle_async(target);
    }
}
