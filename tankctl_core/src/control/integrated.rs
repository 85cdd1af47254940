//! Position control delegated to a motor's built-in closed loop.

use tankctl_traits::PositionMotor;

use crate::settled::SettledUtil;
use crate::time::TimeUtil;

use super::AsyncPositionController;

/// Sends absolute position targets to a motor that closes the loop itself.
///
/// The controller only tracks the target and polls the motor position for
/// settle detection. Disabling commands zero velocity; re-enabling resumes the
/// last target if one was ever set.
pub struct AsyncPosIntegratedController<M> {
    motor: M,
    target: f64,
    has_first_target: bool,
    max_velocity: i32,
    disabled: bool,
    settled: SettledUtil,
}

impl<M: PositionMotor> AsyncPosIntegratedController<M> {
    pub fn new(motor: M, time_util: &TimeUtil) -> Self {
        let max_velocity = motor.gearing().max_rpm();
        Self {
            motor,
            target: 0.0,
            has_first_target: false,
            max_velocity,
            disabled: false,
            settled: time_util.settled_util(),
        }
    }

    /// Cap the velocity used for position moves, in rpm.
    pub fn set_max_velocity(&mut self, rpm: i32) {
        self.max_velocity = rpm.abs();
    }

    pub fn max_velocity(&self) -> i32 {
        self.max_velocity
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    fn resume_movement(&mut self) {
        if self.disabled {
            self.motor.move_velocity(0);
        } else if self.has_first_target {
            self.motor.move_absolute(self.target, self.max_velocity);
        }
    }
}

impl<M: PositionMotor> AsyncPositionController for AsyncPosIntegratedController<M> {
    fn set_target(&mut self, target: f64) {
        tracing::info!(target, "integrated controller: set target");
        self.has_first_target = true;
        self.target = target;
        if !self.disabled {
            self.motor.move_absolute(target, self.max_velocity);
        }
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn error(&self) -> f64 {
        self.target - self.motor.position()
    }

    fn is_settled(&mut self) -> bool {
        if self.disabled {
            return true;
        }
        let error = self.error();
        self.settled.is_settled(error)
    }

    fn reset(&mut self) {
        tracing::info!("integrated controller: reset");
        self.has_first_target = false;
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        tracing::info!(disabled, "integrated controller: flip disable");
        self.disabled = disabled;
        self.resume_movement();
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankctl_traits::Gearset;

    #[derive(Default)]
    struct RecMotor {
        position: f64,
        moves: Vec<(f64, i32)>,
        velocities: Vec<i32>,
    }

    impl PositionMotor for RecMotor {
        fn move_absolute(&mut self, position: f64, velocity: i32) {
            self.moves.push((position, velocity));
        }
        fn move_velocity(&mut self, velocity: i32) {
            self.velocities.push(velocity);
        }
        fn position(&self) -> f64 {
            self.position
        }
        fn gearing(&self) -> Gearset {
            Gearset::Blue
        }
    }

    #[test]
    fn set_target_moves_at_gearset_max_rpm() {
        let mut c = AsyncPosIntegratedController::new(RecMotor::default(), &TimeUtil::default());
        c.set_target(720.0);
        assert_eq!(c.motor().moves, vec![(720.0, 600)]);
        assert_eq!(c.error(), 720.0);
    }

    #[test]
    fn disable_stops_and_enable_resumes() {
        let mut c = AsyncPosIntegratedController::new(RecMotor::default(), &TimeUtil::default());
        c.flip_disable(true);
        c.set_target(100.0);
        assert!(c.motor().moves.is_empty());
        assert_eq!(c.motor().velocities, vec![0]);
        assert!(c.is_settled());
        c.flip_disable(false);
        assert_eq!(c.motor().moves, vec![(100.0, 600)]);
    }

    #[test]
    fn enable_without_target_does_not_move() {
        let mut c = AsyncPosIntegratedController::new(RecMotor::default(), &TimeUtil::default());
        c.flip_disable(false);
        assert!(c.motor().moves.is_empty());
    }
}
