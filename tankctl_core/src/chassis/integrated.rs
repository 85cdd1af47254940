//! Chassis controller built on two integrated position loops.

use tankctl_traits::{ChassisModel, EncoderUnits, SensorVals};

use crate::control::AsyncPositionController;
use crate::error::{Result, invalid_config};
use crate::time::{Rate, TimeUtil};
use crate::units::{DEGREE, METER, QAngle, QLength};

use super::{ChassisController, ChassisScales, ChassisState, GearsetRatioPair};

const SETTLE_POLL_MS: u64 = 10;

/// Drives both sides of a tank chassis to encoder targets derived from
/// [`ChassisScales`].
///
/// Targets are absolute: every move adds its tick delta to the current sensor
/// readings, so the model's encoders are never reset.
pub struct ChassisControllerIntegrated<C, M> {
    model: M,
    left: C,
    right: C,
    rate: Rate,
    gear_ratio: f64,
    straight_scale: f64,
    turn_scale: f64,
    last_target: f64,
    state: ChassisState,
}

impl<C, M> core::fmt::Debug for ChassisControllerIntegrated<C, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChassisControllerIntegrated")
            .field("gear_ratio", &self.gear_ratio)
            .field("straight_scale", &self.straight_scale)
            .field("turn_scale", &self.turn_scale)
            .field("last_target", &self.last_target)
            .field("state", &self.state)
            .finish()
    }
}

impl<C, M> ChassisControllerIntegrated<C, M>
where
    C: AsyncPositionController,
    M: ChassisModel,
{
    /// Fails with `InvalidConfiguration` when the gear ratio is zero or not finite.
    pub fn new(
        time_util: &TimeUtil,
        mut model: M,
        left: C,
        right: C,
        gearset: GearsetRatioPair,
        scales: &ChassisScales,
    ) -> Result<Self> {
        if gearset.ratio == 0.0 || !gearset.ratio.is_finite() {
            return Err(invalid_config(format!(
                "ChassisControllerIntegrated: the gear ratio cannot be zero, got {} \
                 (check for integer division)",
                gearset.ratio
            )));
        }

        model.set_gearing(gearset.internal);
        model.set_encoder_units(EncoderUnits::Degrees);

        Ok(Self {
            model,
            left,
            right,
            rate: time_util.rate(),
            gear_ratio: gearset.ratio,
            straight_scale: scales.straight(),
            turn_scale: scales.turn(),
            last_target: 0.0,
            state: ChassisState::Idle,
        })
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    /// Tick delta of the most recent move.
    pub fn last_target(&self) -> f64 {
        self.last_target
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn left(&self) -> &C {
        &self.left
    }

    pub fn right(&self) -> &C {
        &self.right
    }

    pub fn sensor_vals(&self) -> SensorVals {
        self.model.sensor_vals()
    }

    /// Open-loop tank drive. Any closed-loop move is cancelled first.
    pub fn tank(&mut self, left: f64, right: f64) {
        self.release();
        self.model.tank(left, right);
    }

    pub fn arcade(&mut self, forward: f64, yaw: f64) {
        self.release();
        self.model.arcade(forward, yaw);
    }

    pub fn forward(&mut self, speed: f64) {
        self.release();
        self.model.forward(speed);
    }

    pub fn rotate(&mut self, speed: f64) {
        self.release();
        self.model.rotate(speed);
    }

    fn release(&mut self) {
        self.left.flip_disable(true);
        self.right.flip_disable(true);
        self.state = ChassisState::Idle;
    }

    fn start(&mut self, left_ticks: f64, right_ticks: f64) {
        self.left.reset();
        self.right.reset();
        self.left.flip_disable(false);
        self.right.flip_disable(false);

        let enc = self.model.sensor_vals();
        self.left.set_target(left_ticks + enc.left);
        self.right.set_target(right_ticks + enc.right);
        self.last_target = left_ticks;
        self.state = ChassisState::Moving;
    }
}

impl<C, M> ChassisController for ChassisControllerIntegrated<C, M>
where
    C: AsyncPositionController,
    M: ChassisModel,
{
    fn move_distance_async(&mut self, target: QLength) {
        let meters = target.convert(METER);
        let ticks = meters * self.straight_scale * self.gear_ratio;
        tracing::info!(meters, ticks, "chassis: moving");
        self.start(ticks, ticks);
    }

    fn turn_angle_async(&mut self, target: QAngle) {
        let degrees = target.convert(DEGREE);
        let ticks = degrees * self.turn_scale * self.gear_ratio;
        tracing::info!(degrees, ticks, "chassis: turning");
        self.start(ticks, -ticks);
    }

    fn wait_until_settled(&mut self) {
        tracing::info!("chassis: waiting to settle");
        // Both sides are polled every time so each settle timer sees every sample.
        loop {
            let left = self.left.is_settled();
            let right = self.right.is_settled();
            if left && right {
                break;
            }
            self.rate.delay_until_ms(SETTLE_POLL_MS);
        }
        self.state = ChassisState::Settled;

        self.left.flip_disable(true);
        self.right.flip_disable(true);
        self.model.stop();
        self.state = ChassisState::Idle;
        tracing::info!("chassis: done waiting to settle");
    }

    fn stop(&mut self) {
        tracing::info!(state = ?self.state, "chassis: stop");
        self.release();
        self.model.stop();
    }

    /// Non-blocking poll. The state stays `Moving` until `wait_until_settled`.
    fn is_settled(&mut self) -> bool {
        let left = self.left.is_settled();
        let right = self.right.is_settled();
        left && right
    }

    fn state(&self) -> ChassisState {
        self.state
    }

    fn straight_scale(&self) -> f64 {
        self.straight_scale
    }

    fn turn_scale(&self) -> f64 {
        self.turn_scale
    }
}
