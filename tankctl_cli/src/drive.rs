//! Config mapping, simulated hardware assembly, and move execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use tankctl_core::chassis::{
    ChassisController, ChassisControllerIntegrated, ChassisScales, GearsetRatioPair,
};
use tankctl_core::control::{AsyncPosIntegratedController, AsyncPositionController};
use tankctl_core::filter::EmaFilter;
use tankctl_core::units::UnitExt;
use tankctl_core::{AsyncControllerBuilder, LoopCfg, PidGains, SettleCfg, TimeUtil};
use tankctl_hardware::{SimulatedChassis, SimulatedMotor};
use tankctl_traits::{Clock, MonotonicClock};
use thiserror::Error;

/// Why a run stopped before settling.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    #[error("interrupted by user")]
    Interrupted,
    #[error("max run time of {max_run_ms} ms exceeded before settling")]
    MaxRuntime { max_run_ms: u64 },
}

impl Abort {
    pub fn name(self) -> &'static str {
        match self {
            Abort::Interrupted => "Interrupted",
            Abort::MaxRuntime { .. } => "MaxRuntime",
        }
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub command: &'static str,
    /// Commanded delta in encoder ticks.
    pub target_ticks: f64,
    pub left: f64,
    pub right: f64,
    pub elapsed_ms: u64,
}

pub enum Motion {
    Distance { meters: f64 },
    Angle { degrees: f64 },
}

/// Cancellation inputs shared by every run.
pub struct Guard {
    pub shutdown: Arc<AtomicBool>,
    pub max_run_ms: u64,
}

type SimChassis =
    ChassisControllerIntegrated<AsyncPosIntegratedController<SimulatedMotor>, SimulatedChassis>;

fn time_util(cfg: &tankctl_config::Config) -> TimeUtil {
    TimeUtil::new(
        Arc::new(MonotonicClock::new()),
        SettleCfg::from(&cfg.settle),
    )
}

pub fn scales(cfg: &tankctl_config::Config) -> eyre::Result<ChassisScales> {
    ChassisScales::try_from(&cfg.chassis).wrap_err("derive chassis scales")
}

fn build_chassis(
    cfg: &tankctl_config::Config,
    tu: &TimeUtil,
) -> eyre::Result<(SimChassis, SimulatedChassis)> {
    let scales = scales(cfg)?;
    let gearset = GearsetRatioPair::from(&cfg.gearset);
    let sim = SimulatedChassis::with_gearset(gearset.internal, cfg.sim.max_ticks_per_read)
        .wrap_err("create simulated chassis")?;
    let left = AsyncPosIntegratedController::new(sim.left(), tu);
    let right = AsyncPosIntegratedController::new(sim.right(), tu);
    let chassis = ChassisControllerIntegrated::new(tu, sim.clone(), left, right, gearset, &scales)?;
    Ok((chassis, sim))
}

/// Poll `settled` at the configured loop period until it holds, the user
/// interrupts, or the max run time elapses.
fn wait_guarded(
    tu: &TimeUtil,
    period: Duration,
    guard: &Guard,
    mut settled: impl FnMut() -> bool,
) -> Result<u64, Abort> {
    let clock = tu.clock();
    let start = clock.now();
    let mut rate = tu.rate();
    loop {
        if guard.shutdown.load(Ordering::Relaxed) {
            return Err(Abort::Interrupted);
        }
        let elapsed_ms = clock.ms_since(start);
        if guard.max_run_ms > 0 && elapsed_ms >= guard.max_run_ms {
            return Err(Abort::MaxRuntime {
                max_run_ms: guard.max_run_ms,
            });
        }
        if settled() {
            return Ok(elapsed_ms);
        }
        rate.delay_until(period);
    }
}

pub fn run_chassis(
    cfg: &tankctl_config::Config,
    motion: Motion,
    guard: &Guard,
) -> eyre::Result<Outcome> {
    let tu = time_util(cfg);
    let period = LoopCfg::from(&cfg.timing).period;
    let (mut chassis, sim) = build_chassis(cfg, &tu)?;

    let command = match motion {
        Motion::Distance { meters } => {
            chassis.move_distance_async(meters.meter());
            "move"
        }
        Motion::Angle { degrees } => {
            chassis.turn_angle_async(degrees.deg());
            "turn"
        }
    };

    let elapsed_ms = match wait_guarded(&tu, period, guard, || chassis.is_settled()) {
        Ok(ms) => ms,
        Err(abort) => {
            tracing::warn!(reason = abort.name(), "aborting move");
            chassis.stop();
            return Err(abort.into());
        }
    };
    // Already settled; this releases both sides and stops the model.
    chassis.wait_until_settled();

    Ok(Outcome {
        command,
        target_ticks: chassis.last_target(),
        left: sim.left().peek_position(),
        right: sim.right().peek_position(),
        elapsed_ms,
    })
}

pub fn run_hold(cfg: &tankctl_config::Config, ticks: f64, guard: &Guard) -> eyre::Result<Outcome> {
    let tu = time_util(cfg);
    let period = LoopCfg::from(&cfg.timing).period;
    let gearset = GearsetRatioPair::from(&cfg.gearset);
    let motor = SimulatedMotor::new(gearset.internal)
        .with_max_ticks_per_read(cfg.sim.max_ticks_per_read)
        .wrap_err("create simulated motor")?;

    let mut builder = AsyncControllerBuilder::new(tu.clone()).input(motor.clone());
    if let Some(alpha) = cfg.filter.ema_alpha {
        builder = builder.filter(EmaFilter::new(alpha)?);
    }
    let gains = PidGains::from(&cfg.pid);
    let mut arm = builder
        .pos_pid(gains.kp, gains.ki, gains.kd, gains.bias)
        .output(motor.clone())
        .with_sample_time(period)
        .build()?;

    arm.set_target(ticks);
    let waited = wait_guarded(&tu, period, guard, || arm.is_settled());
    arm.flip_disable(true);
    let elapsed_ms = match waited {
        Ok(ms) => ms,
        Err(abort) => {
            tracing::warn!(reason = abort.name(), "aborting hold");
            return Err(abort.into());
        }
    };

    let position = motor.peek_position();
    Ok(Outcome {
        command: "hold",
        target_ticks: ticks,
        left: position,
        right: position,
        elapsed_ms,
    })
}
