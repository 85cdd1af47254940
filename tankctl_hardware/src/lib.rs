//! Simulated drivetrain hardware.
//!
//! The simulation is stepped by observation: a motor advances one slew step
//! every time its position is read. Control loops that poll position therefore
//! see deterministic motion regardless of wall-clock timing.

pub mod error;

use std::sync::Arc;

use parking_lot::Mutex;
use tankctl_traits::{
    ChassisModel, ControllerInput, ControllerOutput, EncoderUnits, Gearset, PositionMotor,
    SensorVals,
};

use crate::error::{HwError, Result};

/// Default travel per read at full speed, in encoder units.
pub const DEFAULT_MAX_TICKS_PER_READ: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorMode {
    Idle,
    /// Open-loop output in `[-1.0, 1.0]`.
    Voltage(f64),
    Velocity(i32),
    Position { target: f64, velocity: i32 },
}

#[derive(Debug)]
struct MotorState {
    position: f64,
    mode: MotorMode,
    max_ticks_per_read: f64,
    gearset: Gearset,
    units: EncoderUnits,
}

impl MotorState {
    fn advance(&mut self) {
        let max_rpm = f64::from(self.gearset.max_rpm());
        let step = self.max_ticks_per_read;
        match self.mode {
            MotorMode::Idle => {}
            MotorMode::Voltage(v) => self.position += v.clamp(-1.0, 1.0) * step,
            MotorMode::Velocity(rpm) => {
                self.position += (f64::from(rpm) / max_rpm).clamp(-1.0, 1.0) * step;
            }
            MotorMode::Position { target, velocity } => {
                let max_step = (f64::from(velocity.abs()) / max_rpm).clamp(0.0, 1.0) * step;
                let remaining = target - self.position;
                if remaining.abs() <= max_step {
                    self.position = target;
                } else {
                    self.position += max_step.copysign(remaining);
                }
            }
        }
    }
}

/// A motor with a built-in position loop. Clones share the same motor.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    state: Arc<Mutex<MotorState>>,
}

impl Default for SimulatedMotor {
    fn default() -> Self {
        Self::new(Gearset::default())
    }
}

impl SimulatedMotor {
    pub fn new(gearset: Gearset) -> Self {
        Self {
            state: Arc::new(Mutex::new(MotorState {
                position: 0.0,
                mode: MotorMode::Idle,
                max_ticks_per_read: DEFAULT_MAX_TICKS_PER_READ,
                gearset,
                units: EncoderUnits::default(),
            })),
        }
    }

    /// Set how far the motor may travel per read at full speed.
    pub fn with_max_ticks_per_read(self, ticks: f64) -> Result<Self> {
        if !(ticks.is_finite() && ticks > 0.0) {
            return Err(HwError::InvalidParameter(format!(
                "max_ticks_per_read must be > 0, got {ticks}"
            )));
        }
        self.state.lock().max_ticks_per_read = ticks;
        Ok(self)
    }

    /// Position without advancing the simulation.
    pub fn peek_position(&self) -> f64 {
        self.state.lock().position
    }

    pub fn mode(&self) -> MotorMode {
        self.state.lock().mode
    }

    pub fn set_voltage(&self, value: f64) {
        self.state.lock().mode = MotorMode::Voltage(value.clamp(-1.0, 1.0));
    }

    pub fn tare_position(&self) {
        self.state.lock().position = 0.0;
    }

    pub fn set_gearing(&self, gearset: Gearset) {
        self.state.lock().gearset = gearset;
    }

    pub fn encoder_units(&self) -> EncoderUnits {
        self.state.lock().units
    }

    pub fn set_encoder_units(&self, units: EncoderUnits) {
        self.state.lock().units = units;
    }
}

impl PositionMotor for SimulatedMotor {
    fn move_absolute(&mut self, position: f64, velocity: i32) {
        self.state.lock().mode = MotorMode::Position {
            target: position,
            velocity,
        };
    }

    fn move_velocity(&mut self, velocity: i32) {
        self.state.lock().mode = if velocity == 0 {
            MotorMode::Idle
        } else {
            MotorMode::Velocity(velocity)
        };
    }

    fn position(&self) -> f64 {
        let mut s = self.state.lock();
        s.advance();
        s.position
    }

    fn gearing(&self) -> Gearset {
        self.state.lock().gearset
    }
}

impl ControllerInput for SimulatedMotor {
    fn controller_get(&mut self) -> f64 {
        PositionMotor::position(self)
    }
}

impl ControllerOutput for SimulatedMotor {
    fn controller_set(&mut self, value: f64) {
        self.set_voltage(value);
    }
}

/// Replays a fixed list of readings, then holds the last one.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    readings: Vec<f64>,
    idx: usize,
}

impl SimulatedSensor {
    pub fn new(readings: Vec<f64>) -> Result<Self> {
        if readings.is_empty() {
            return Err(HwError::EmptyScript);
        }
        Ok(Self { readings, idx: 0 })
    }

    pub fn remaining(&self) -> usize {
        self.readings.len().saturating_sub(self.idx)
    }
}

impl ControllerInput for SimulatedSensor {
    fn controller_get(&mut self) -> f64 {
        let last = self.readings.len() - 1;
        let v = self.readings[self.idx.min(last)];
        self.idx = self.idx.saturating_add(1);
        v
    }
}

/// Skid-steer chassis over two simulated motors.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChassis {
    left: SimulatedMotor,
    right: SimulatedMotor,
}

impl SimulatedChassis {
    pub fn new(left: SimulatedMotor, right: SimulatedMotor) -> Self {
        Self { left, right }
    }

    /// Two fresh motors sharing a gearset and slew rate.
    pub fn with_gearset(gearset: Gearset, max_ticks_per_read: f64) -> Result<Self> {
        Ok(Self::new(
            SimulatedMotor::new(gearset).with_max_ticks_per_read(max_ticks_per_read)?,
            SimulatedMotor::new(gearset).with_max_ticks_per_read(max_ticks_per_read)?,
        ))
    }

    /// Handle to the left motor (shares state with the chassis).
    pub fn left(&self) -> SimulatedMotor {
        self.left.clone()
    }

    pub fn right(&self) -> SimulatedMotor {
        self.right.clone()
    }
}

impl ChassisModel for SimulatedChassis {
    fn sensor_vals(&self) -> SensorVals {
        SensorVals {
            left: self.left.position(),
            right: self.right.position(),
        }
    }

    fn reset_sensors(&mut self) {
        self.left.tare_position();
        self.right.tare_position();
    }

    fn stop(&mut self) {
        tracing::debug!("simulated chassis: stop");
        self.left.move_velocity(0);
        self.right.move_velocity(0);
    }

    fn tank(&mut self, left: f64, right: f64) {
        self.left.set_voltage(left);
        self.right.set_voltage(right);
    }

    fn arcade(&mut self, forward: f64, yaw: f64) {
        let forward = forward.clamp(-1.0, 1.0);
        let yaw = yaw.clamp(-1.0, 1.0);
        let mut left = forward + yaw;
        let mut right = forward - yaw;
        let max = left.abs().max(right.abs());
        if max > 1.0 {
            left /= max;
            right /= max;
        }
        self.tank(left, right);
    }

    fn set_gearing(&mut self, gearset: Gearset) {
        tracing::debug!(?gearset, "simulated chassis: set gearing");
        self.left.set_gearing(gearset);
        self.right.set_gearing(gearset);
    }

    fn set_encoder_units(&mut self, units: EncoderUnits) {
        self.left.set_encoder_units(units);
        self.right.set_encoder_units(units);
    }
}
