//! `From`/`TryFrom` implementations bridging `tankctl_config` types to core types.

use std::time::Duration;

use tankctl_traits::Gearset;

use crate::chassis::{ChassisScales, GearsetRatioPair};
use crate::config::{LoopCfg, PidGains, SettleCfg};
use crate::error::Report;
use crate::units::{INCH, QLength};

// ── SettleCfg ────────────────────────────────────────────────────────────────

impl From<&tankctl_config::SettleCfg> for SettleCfg {
    fn from(c: &tankctl_config::SettleCfg) -> Self {
        Self {
            at_target_error: c.at_target_error,
            at_target_derivative: c.at_target_derivative,
            at_target_time: Duration::from_millis(c.at_target_time_ms),
        }
    }
}

// ── PidGains ─────────────────────────────────────────────────────────────────

impl From<&tankctl_config::PidCfg> for PidGains {
    fn from(c: &tankctl_config::PidCfg) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
            bias: c.bias,
        }
    }
}

// ── LoopCfg ──────────────────────────────────────────────────────────────────

impl From<&tankctl_config::TimingCfg> for LoopCfg {
    fn from(c: &tankctl_config::TimingCfg) -> Self {
        Self {
            period: Duration::from_millis(c.loop_period_ms),
        }
    }
}

// ── GearsetRatioPair ─────────────────────────────────────────────────────────

impl From<&tankctl_config::GearsetCfg> for GearsetRatioPair {
    fn from(c: &tankctl_config::GearsetCfg) -> Self {
        let internal = match c.cartridge {
            tankctl_config::Cartridge::Red => Gearset::Red,
            tankctl_config::Cartridge::Green => Gearset::Green,
            tankctl_config::Cartridge::Blue => Gearset::Blue,
        };
        Self::new(internal, c.ratio)
    }
}

// ── ChassisScales ────────────────────────────────────────────────────────────

/// Measurements take precedence when both forms are present; `Config::validate`
/// rejects that case before it gets here.
impl TryFrom<&tankctl_config::ChassisCfg> for ChassisScales {
    type Error = Report;

    fn try_from(c: &tankctl_config::ChassisCfg) -> Result<Self, Self::Error> {
        let tpr = c.ticks_per_rev();
        let inches = |v: f64| -> QLength { v * INCH };

        if let (Some(d), Some(w)) = (c.wheel_diameter_in, c.track_width_in) {
            let mut dims = vec![inches(d), inches(w)];
            match (c.middle_wheel_distance_in, c.middle_wheel_diameter_in) {
                (Some(dist), Some(diam)) => dims.extend([inches(dist), inches(diam)]),
                (Some(dist), None) => dims.push(inches(dist)),
                (None, Some(diam)) => dims.extend([QLength::ZERO, inches(diam)]),
                (None, None) => {}
            }
            return Self::from_measurements(&dims, tpr);
        }

        let mut ratios: Vec<f64> = c.straight.into_iter().chain(c.turn).collect();
        if let Some(dist) = c.middle_wheel_distance_in {
            ratios.push(inches(dist).convert(crate::units::METER));
        }
        ratios.extend(c.middle);
        Self::from_ratios(&ratios, tpr)
    }
}
