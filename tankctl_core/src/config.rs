//! Runtime configuration types for the control core.
//!
//! These are separate from the TOML-deserialized config in `tankctl_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

/// Settle policy: a loop is settled once `|error| <= at_target_error` and
/// `|Δerror| <= at_target_derivative` have both held for `at_target_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleCfg {
    pub at_target_error: f64,
    /// Maximum change of the error between two consecutive checks.
    pub at_target_derivative: f64,
    pub at_target_time: Duration,
}

impl Default for SettleCfg {
    fn default() -> Self {
        Self {
            at_target_error: 50.0,
            at_target_derivative: 5.0,
            at_target_time: Duration::from_millis(250),
        }
    }
}

/// Position PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Constant added to the output.
    pub bias: f64,
}

/// Loop timing for background controllers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopCfg {
    /// Period between two steps of an async controller.
    pub period: Duration,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
        }
    }
}
