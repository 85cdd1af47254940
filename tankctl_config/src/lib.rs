#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tankctl drivetrain.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Only `[chassis]` is required; every other table has defaults.
use serde::Deserialize;

/// Drivetrain geometry, given either as measurements or as precomputed scales.
///
/// Measurements form: `wheel_diameter_in` + `track_width_in`, optionally
/// `middle_wheel_distance_in` / `middle_wheel_diameter_in`.
/// Ratio form: `straight` + `turn`, optionally `middle_wheel_distance_in` + `middle`.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ChassisCfg {
    /// Encoder ticks per wheel revolution; defaults to 360 (degree units).
    pub ticks_per_rev: Option<u32>,
    pub wheel_diameter_in: Option<f64>,
    pub track_width_in: Option<f64>,
    /// Ticks per meter.
    pub straight: Option<f64>,
    /// Wheel degrees per chassis degree.
    pub turn: Option<f64>,
    pub middle_wheel_distance_in: Option<f64>,
    pub middle_wheel_diameter_in: Option<f64>,
    /// Middle wheel ticks per meter (ratio form only).
    pub middle: Option<f64>,
}

impl ChassisCfg {
    pub const DEFAULT_TICKS_PER_REV: u32 = 360;

    pub fn ticks_per_rev(&self) -> u32 {
        self.ticks_per_rev.unwrap_or(Self::DEFAULT_TICKS_PER_REV)
    }

    pub fn is_measurements(&self) -> bool {
        self.wheel_diameter_in.is_some() && self.track_width_in.is_some()
    }

    pub fn is_ratios(&self) -> bool {
        self.straight.is_some() && self.turn.is_some()
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Cartridge {
    Red,
    #[default]
    Green,
    Blue,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GearsetCfg {
    pub cartridge: Cartridge,
    /// External gear ratio between motor and wheel.
    pub ratio: f64,
}

impl Default for GearsetCfg {
    fn default() -> Self {
        Self {
            cartridge: Cartridge::Green,
            ratio: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SettleCfg {
    pub at_target_error: f64,
    pub at_target_derivative: f64,
    pub at_target_time_ms: u64,
}

impl Default for SettleCfg {
    fn default() -> Self {
        Self {
            at_target_error: 50.0,
            at_target_derivative: 5.0,
            at_target_time_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TimingCfg {
    pub loop_period_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self { loop_period_ms: 10 }
    }
}

/// Position PID gains for the single-axis `hold` loop.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PidCfg {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub bias: f64,
}

impl Default for PidCfg {
    fn default() -> Self {
        Self {
            kp: 0.001,
            ki: 0.0,
            kd: 0.0001,
            bias: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct FilterCfg {
    /// Optional EMA prefilter. Range: (0.0, 1.0].
    pub ema_alpha: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimCfg {
    /// How far a simulated motor may travel per position read, in ticks.
    pub max_ticks_per_read: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            max_ticks_per_read: 20.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub chassis: ChassisCfg,
    #[serde(default)]
    pub gearset: GearsetCfg,
    #[serde(default)]
    pub settle: SettleCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub pid: PidCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub sim: SimCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn positive(name: &str, v: Option<f64>) -> eyre::Result<()> {
    if let Some(v) = v
        && !(v.is_finite() && v > 0.0)
    {
        eyre::bail!("{name} must be > 0");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Chassis
        let c = &self.chassis;
        match (c.is_measurements(), c.is_ratios()) {
            (true, false) | (false, true) => {}
            (true, true) => {
                eyre::bail!("chassis must use either measurements or ratios, not both");
            }
            (false, false) => {
                eyre::bail!(
                    "chassis requires either wheel_diameter_in + track_width_in or straight + turn"
                );
            }
        }
        if c.ticks_per_rev == Some(0) {
            eyre::bail!("chassis.ticks_per_rev must be > 0");
        }
        positive("chassis.wheel_diameter_in", c.wheel_diameter_in)?;
        positive("chassis.track_width_in", c.track_width_in)?;
        positive("chassis.straight", c.straight)?;
        positive("chassis.turn", c.turn)?;
        positive("chassis.middle_wheel_diameter_in", c.middle_wheel_diameter_in)?;
        positive("chassis.middle", c.middle)?;
        if let Some(d) = c.middle_wheel_distance_in
            && !d.is_finite()
        {
            eyre::bail!("chassis.middle_wheel_distance_in must be finite");
        }
        if c.is_ratios() && c.middle_wheel_distance_in.is_some() != c.middle.is_some() {
            eyre::bail!("chassis.middle_wheel_distance_in and chassis.middle must be given together");
        }

        // Gearset
        if !(self.gearset.ratio.is_finite() && self.gearset.ratio > 0.0) {
            eyre::bail!("gearset.ratio must be > 0");
        }

        // Settle
        if !(self.settle.at_target_error >= 0.0) {
            eyre::bail!("settle.at_target_error must be >= 0");
        }
        if !(self.settle.at_target_derivative >= 0.0) {
            eyre::bail!("settle.at_target_derivative must be >= 0");
        }
        if self.settle.at_target_time_ms > 60 * 1000 {
            eyre::bail!("settle.at_target_time_ms is unreasonably large (>60s)");
        }

        // Timing
        if self.timing.loop_period_ms == 0 {
            eyre::bail!("timing.loop_period_ms must be >= 1");
        }

        // PID
        for (name, v) in [
            ("pid.kp", self.pid.kp),
            ("pid.ki", self.pid.ki),
            ("pid.kd", self.pid.kd),
            ("pid.bias", self.pid.bias),
        ] {
            if !v.is_finite() {
                eyre::bail!("{name} must be finite");
            }
        }

        // Filter
        if let Some(alpha) = self.filter.ema_alpha
            && !(alpha > 0.0 && alpha <= 1.0)
        {
            eyre::bail!("filter.ema_alpha must be in (0.0, 1.0]");
        }

        // Sim
        if !(self.sim.max_ticks_per_read.is_finite() && self.sim.max_ticks_per_read > 0.0) {
            eyre::bail!("sim.max_ticks_per_read must be > 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
