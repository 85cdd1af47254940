//! Per-tick controllers: position PID, velocity PID and closure-defined laws.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tankctl_traits::Clock;

use crate::config::PidGains;
use crate::error::{Result, invalid_config};
use crate::filter::{AverageFilter, Filter};
use crate::settled::SettledUtil;
use crate::time::TimeUtil;

const DEFAULT_SAMPLE_TIME: Duration = Duration::from_millis(10);

/// A controller stepped once per tick with the latest reading.
pub trait IterativeController {
    /// Consume one reading and return the new control output.
    fn step(&mut self, reading: f64) -> f64;
    fn set_target(&mut self, target: f64);
    fn target(&self) -> f64;
    /// Last output returned by `step`.
    fn output(&self) -> f64;
    /// `target - last reading` in the controller's own units.
    fn error(&self) -> f64;
    fn is_settled(&mut self) -> bool;
    fn reset(&mut self);
    fn flip_disable(&mut self, disabled: bool);
    fn is_disabled(&self) -> bool;
    /// Period the controller expects to be stepped at.
    fn sample_time(&self) -> Duration;
    fn set_sample_time(&mut self, sample_time: Duration);
}

/// Position PID with integral clamping and integral reset on error sign change.
///
/// Integral and derivative gains are per second; they are rescaled to the sample time
/// whenever either changes. The derivative acts on the measurement, not the error,
/// so target jumps do not kick the output.
pub struct IterativePosPidController {
    gains: PidGains,
    ki_scaled: f64,
    kd_scaled: f64,
    target: f64,
    last_reading: f64,
    error: f64,
    last_error: f64,
    integral: f64,
    output: f64,
    output_limits: (f64, f64),
    integral_limits: (f64, f64),
    /// Integrate only while `min < |error| < max`.
    error_sum_limits: (f64, f64),
    reset_on_cross: bool,
    sample_time: Duration,
    last_step: Option<Instant>,
    disabled: bool,
    clock: Arc<dyn Clock + Send + Sync>,
    settled: SettledUtil,
}

impl core::fmt::Debug for IterativePosPidController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IterativePosPidController")
            .field("gains", &self.gains)
            .field("target", &self.target)
            .field("error", &self.error)
            .field("output", &self.output)
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl IterativePosPidController {
    pub fn new(gains: PidGains, time_util: &TimeUtil) -> Self {
        let mut pid = Self {
            gains,
            ki_scaled: 0.0,
            kd_scaled: 0.0,
            target: 0.0,
            last_reading: 0.0,
            error: 0.0,
            last_error: 0.0,
            integral: 0.0,
            output: 0.0,
            output_limits: (-1.0, 1.0),
            integral_limits: (-1.0, 1.0),
            error_sum_limits: (0.0, f64::INFINITY),
            reset_on_cross: true,
            sample_time: DEFAULT_SAMPLE_TIME,
            last_step: None,
            disabled: false,
            clock: time_util.clock(),
            settled: time_util.settled_util(),
        };
        pid.set_gains(gains);
        pid
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        let dt = self.sample_time.as_secs_f64();
        self.gains = gains;
        self.ki_scaled = gains.ki * dt;
        self.kd_scaled = if dt > 0.0 { gains.kd / dt } else { 0.0 };
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Clamp range of the output. Bounds are reordered if given backwards.
    pub fn set_output_limits(&mut self, a: f64, b: f64) {
        self.output_limits = (a.min(b), a.max(b));
        self.output = self.output.clamp(self.output_limits.0, self.output_limits.1);
    }

    pub fn set_integral_limits(&mut self, a: f64, b: f64) {
        self.integral_limits = (a.min(b), a.max(b));
        self.integral = self
            .integral
            .clamp(self.integral_limits.0, self.integral_limits.1);
    }

    pub fn set_error_sum_limits(&mut self, min: f64, max: f64) {
        self.error_sum_limits = (min.abs().min(max.abs()), min.abs().max(max.abs()));
    }

    pub fn set_integrator_reset(&mut self, reset_on_cross: bool) {
        self.reset_on_cross = reset_on_cross;
    }

    fn due(&mut self) -> bool {
        let now = self.clock.now();
        match self.last_step {
            Some(last) if now.saturating_duration_since(last) < self.sample_time => false,
            _ => {
                self.last_step = Some(now);
                true
            }
        }
    }
}

impl IterativeController for IterativePosPidController {
    fn step(&mut self, reading: f64) -> f64 {
        if self.disabled {
            self.output = 0.0;
            return 0.0;
        }
        if !self.due() {
            return self.output;
        }

        self.error = self.target - reading;
        let magnitude = self.error.abs();
        if magnitude > self.error_sum_limits.0 && magnitude < self.error_sum_limits.1 {
            self.integral += self.ki_scaled * self.error;
        }
        if self.reset_on_cross && self.error.signum() != self.last_error.signum() {
            self.integral = 0.0;
        }
        self.integral = self
            .integral
            .clamp(self.integral_limits.0, self.integral_limits.1);

        let derivative = self.last_reading - reading;
        self.last_reading = reading;
        self.last_error = self.error;

        self.output = (self.gains.kp * self.error
            + self.integral
            + self.kd_scaled * derivative
            + self.gains.bias)
            .clamp(self.output_limits.0, self.output_limits.1);
        self.output
    }

    fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn is_settled(&mut self) -> bool {
        self.disabled || self.settled.is_settled(self.error)
    }

    fn reset(&mut self) {
        self.error = 0.0;
        self.last_error = 0.0;
        self.last_reading = 0.0;
        self.integral = 0.0;
        self.output = 0.0;
        self.last_step = None;
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn sample_time(&self) -> Duration {
        self.sample_time
    }

    fn set_sample_time(&mut self, sample_time: Duration) {
        if sample_time.is_zero() {
            return;
        }
        self.sample_time = sample_time;
        self.set_gains(self.gains);
    }
}

/// Velocity estimate (rpm) and acceleration from successive encoder positions.
pub struct VelMath {
    ticks_per_rev: f64,
    filter: Box<dyn Filter + Send>,
    clock: Arc<dyn Clock + Send + Sync>,
    last_position: f64,
    last_time: Option<Instant>,
    velocity: f64,
    accel: f64,
}

impl core::fmt::Debug for VelMath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VelMath")
            .field("ticks_per_rev", &self.ticks_per_rev)
            .field("velocity", &self.velocity)
            .field("accel", &self.accel)
            .finish()
    }
}

impl VelMath {
    /// Velocity math smoothed by a two-tap moving average.
    pub fn new(ticks_per_rev: f64, time_util: &TimeUtil) -> Result<Self> {
        Self::with_filter(ticks_per_rev, AverageFilter::<2>::new(), time_util)
    }

    pub fn with_filter(
        ticks_per_rev: f64,
        filter: impl Filter + Send + 'static,
        time_util: &TimeUtil,
    ) -> Result<Self> {
        if !(ticks_per_rev.is_finite() && ticks_per_rev > 0.0) {
            return Err(invalid_config(format!(
                "VelMath: ticks per revolution must be > 0, got {ticks_per_rev}"
            )));
        }
        Ok(Self {
            ticks_per_rev,
            filter: Box::new(filter),
            clock: time_util.clock(),
            last_position: 0.0,
            last_time: None,
            velocity: 0.0,
            accel: 0.0,
        })
    }

    /// Feed a new position and return the filtered velocity in rpm.
    pub fn step(&mut self, position: f64) -> f64 {
        let now = self.clock.now();
        if let Some(last) = self.last_time {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let raw_rpm = (position - self.last_position) / self.ticks_per_rev / dt * 60.0;
                let previous = self.velocity;
                self.velocity = self.filter.filter(raw_rpm);
                self.accel = (self.velocity - previous) / dt;
            }
        }
        self.last_position = position;
        self.last_time = Some(now);
        self.velocity
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn accel(&self) -> f64 {
        self.accel
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_position = 0.0;
        self.last_time = None;
        self.velocity = 0.0;
        self.accel = 0.0;
    }
}

/// Velocity PID with feed-forward: `out = Σ(kp·e − kd·accel) + kf·target`.
pub struct IterativeVelPidController {
    kp: f64,
    kd: f64,
    kf: f64,
    vel_math: VelMath,
    target: f64,
    error: f64,
    power: f64,
    output: f64,
    output_limits: (f64, f64),
    sample_time: Duration,
    last_step: Option<Instant>,
    disabled: bool,
    clock: Arc<dyn Clock + Send + Sync>,
    settled: SettledUtil,
}

impl IterativeVelPidController {
    pub fn new(kp: f64, kd: f64, kf: f64, vel_math: VelMath, time_util: &TimeUtil) -> Self {
        Self {
            kp,
            kd,
            kf,
            vel_math,
            target: 0.0,
            error: 0.0,
            power: 0.0,
            output: 0.0,
            output_limits: (-1.0, 1.0),
            sample_time: DEFAULT_SAMPLE_TIME,
            last_step: None,
            disabled: false,
            clock: time_util.clock(),
            settled: time_util.settled_util(),
        }
    }

    pub fn set_output_limits(&mut self, a: f64, b: f64) {
        self.output_limits = (a.min(b), a.max(b));
    }

    pub fn vel_math(&self) -> &VelMath {
        &self.vel_math
    }
}

impl IterativeController for IterativeVelPidController {
    fn step(&mut self, reading: f64) -> f64 {
        if self.disabled {
            self.output = 0.0;
            return 0.0;
        }

        let velocity = self.vel_math.step(reading);
        self.error = self.target - velocity;

        let now = self.clock.now();
        let due = match self.last_step {
            Some(last) => now.saturating_duration_since(last) >= self.sample_time,
            None => true,
        };
        if due {
            self.last_step = Some(now);
            self.power += self.kp * self.error - self.kd * self.vel_math.accel();
            self.power = self.power.clamp(self.output_limits.0, self.output_limits.1);
        }

        self.output =
            (self.power + self.kf * self.target).clamp(self.output_limits.0, self.output_limits.1);
        self.output
    }

    fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn is_settled(&mut self) -> bool {
        self.disabled || self.settled.is_settled(self.error)
    }

    fn reset(&mut self) {
        self.vel_math.reset();
        self.error = 0.0;
        self.power = 0.0;
        self.output = 0.0;
        self.last_step = None;
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn sample_time(&self) -> Duration {
        self.sample_time
    }

    fn set_sample_time(&mut self, sample_time: Duration) {
        if !sample_time.is_zero() {
            self.sample_time = sample_time;
        }
    }
}

/// A controller whose control law is a closure over its input.
pub struct IterativeLambdaController {
    step_fn: Box<dyn FnMut(f64) -> f64 + Send>,
    target: f64,
    last_input: f64,
    output: f64,
    sample_time: Duration,
    disabled: bool,
    settled: SettledUtil,
}

impl IterativeLambdaController {
    pub fn new<F>(step_fn: F, time_util: &TimeUtil) -> Self
    where
        F: FnMut(f64) -> f64 + Send + 'static,
    {
        Self {
            step_fn: Box::new(step_fn),
            target: 0.0,
            last_input: 0.0,
            output: 0.0,
            sample_time: DEFAULT_SAMPLE_TIME,
            disabled: false,
            settled: time_util.settled_util(),
        }
    }
}

impl IterativeController for IterativeLambdaController {
    fn step(&mut self, reading: f64) -> f64 {
        if self.disabled {
            self.output = 0.0;
            return 0.0;
        }
        self.last_input = reading;
        self.output = (self.step_fn)(reading);
        self.output
    }

    fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn error(&self) -> f64 {
        self.target - self.last_input
    }

    fn is_settled(&mut self) -> bool {
        let error = self.error();
        self.disabled || self.settled.is_settled(error)
    }

    fn reset(&mut self) {
        self.last_input = 0.0;
        self.output = 0.0;
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn sample_time(&self) -> Duration {
        self.sample_time
    }

    fn set_sample_time(&mut self, sample_time: Duration) {
        if !sample_time.is_zero() {
            self.sample_time = sample_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleCfg;
    use tankctl_traits::clock::test_clock::TestClock;

    fn time_util(clock: &TestClock) -> TimeUtil {
        TimeUtil::new(Arc::new(clock.clone()), SettleCfg::default())
    }

    #[test]
    fn proportional_only_output() {
        let clock = TestClock::new();
        let gains = PidGains {
            kp: 0.01,
            ..PidGains::default()
        };
        let mut pid = IterativePosPidController::new(gains, &time_util(&clock));
        pid.set_target(50.0);
        let out = pid.step(0.0);
        assert!((out - 0.5).abs() < 1e-12);
        assert_eq!(pid.error(), 50.0);
    }

    #[test]
    fn output_is_clamped_and_bias_applied() {
        let clock = TestClock::new();
        let gains = PidGains {
            kp: 1.0,
            bias: 0.25,
            ..PidGains::default()
        };
        let mut pid = IterativePosPidController::new(gains, &time_util(&clock));
        pid.set_target(1000.0);
        assert_eq!(pid.step(0.0), 1.0);
        pid.set_target(0.0);
        clock.advance(Duration::from_millis(10));
        // error 0 -> only the bias remains
        assert!((pid.step(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn step_inside_sample_time_reuses_output() {
        let clock = TestClock::new();
        let gains = PidGains {
            kp: 0.001,
            ..PidGains::default()
        };
        let mut pid = IterativePosPidController::new(gains, &time_util(&clock));
        pid.set_target(100.0);
        let first = pid.step(0.0);
        let second = pid.step(90.0);
        assert_eq!(first, second);
        clock.advance(Duration::from_millis(10));
        assert!(pid.step(90.0) < first);
    }

    #[test]
    fn integral_resets_on_error_sign_change() {
        let clock = TestClock::new();
        let gains = PidGains {
            ki: 10.0,
            ..PidGains::default()
        };
        let mut pid = IterativePosPidController::new(gains, &time_util(&clock));
        pid.set_target(1.0);
        let first = pid.step(0.0);
        assert!(first > 0.0);
        clock.advance(Duration::from_millis(10));
        // crosses the target: integral is discarded
        assert_eq!(pid.step(2.0), 0.0);
    }

    #[test]
    fn disabled_pid_outputs_zero_and_reports_settled() {
        let clock = TestClock::new();
        let mut pid = IterativePosPidController::new(
            PidGains {
                kp: 1.0,
                ..PidGains::default()
            },
            &time_util(&clock),
        );
        pid.set_target(10.0);
        pid.flip_disable(true);
        assert_eq!(pid.step(0.0), 0.0);
        assert!(pid.is_settled());
    }

    #[test]
    fn vel_math_reports_rpm() {
        let clock = TestClock::new();
        let mut vm = VelMath::with_filter(
            360.0,
            crate::filter::PassthroughFilter::new(),
            &time_util(&clock),
        )
        .unwrap();
        vm.step(0.0);
        clock.advance(Duration::from_millis(100));
        // 36 ticks in 0.1 s = 1 rev/s = 60 rpm
        assert!((vm.step(36.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn vel_math_rejects_zero_ticks() {
        let clock = TestClock::new();
        assert!(VelMath::new(0.0, &time_util(&clock)).is_err());
    }

    #[test]
    fn vel_pid_feed_forward_only() {
        let clock = TestClock::new();
        let tu = time_util(&clock);
        let vm = VelMath::new(360.0, &tu).unwrap();
        let mut vel = IterativeVelPidController::new(0.0, 0.0, 0.004, vm, &tu);
        vel.set_target(100.0);
        assert!((vel.step(0.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn lambda_applies_closure() {
        let clock = TestClock::new();
        let mut c = IterativeLambdaController::new(|x| x * 2.0, &time_util(&clock));
        c.set_target(5.0);
        assert_eq!(c.step(3.0), 6.0);
        assert_eq!(c.error(), 2.0);
    }
}
