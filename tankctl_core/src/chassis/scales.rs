//! Conversion between physical drivetrain dimensions and encoder-tick scales.

use std::f64::consts::PI;

use crate::error::{Result, invalid_config};
use crate::units::{METER, QLength};

/// Immutable drivetrain geometry plus the derived tick scales.
///
/// - `straight`: encoder ticks per meter of travel
/// - `turn`: track width / wheel diameter, i.e. wheel degrees per chassis degree
/// - `middle`: ticks per meter for an optional middle (strafe) wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisScales {
    tpr: u32,
    wheel_diameter: QLength,
    track_width: QLength,
    middle_wheel_distance: QLength,
    middle_wheel_diameter: QLength,
    straight: f64,
    turn: f64,
    middle: f64,
}

impl ChassisScales {
    /// Build from `[wheel diameter, track width, (middle wheel distance), (middle wheel diameter)]`.
    ///
    /// The middle wheel distance defaults to 0 and its diameter to the wheel diameter.
    ///
    /// ```
    /// use tankctl_core::chassis::ChassisScales;
    /// use tankctl_core::units::UnitExt;
    ///
    /// let scales = ChassisScales::from_measurements(&[4.0.inch(), 11.5.inch()], 900).unwrap();
    /// assert!((scales.turn() - 2.875).abs() < 1e-12);
    /// ```
    pub fn from_measurements(dims: &[QLength], tpr: u32) -> Result<Self> {
        check_inputs(dims.len(), tpr)?;

        let wheel_diameter = dims[0];
        let track_width = dims[1];
        let middle_wheel_distance = dims.get(2).copied().unwrap_or(QLength::ZERO);
        let middle_wheel_diameter = dims.get(3).copied().unwrap_or(wheel_diameter);

        let d = positive_meters("wheel diameter", wheel_diameter)?;
        let md = positive_meters("middle wheel diameter", middle_wheel_diameter)?;
        let tpr_f = f64::from(tpr);

        Ok(Self {
            tpr,
            wheel_diameter,
            track_width,
            middle_wheel_distance,
            middle_wheel_diameter,
            straight: tpr_f / (d * PI),
            turn: track_width.convert(METER) / d,
            middle: tpr_f / (md * PI),
        })
    }

    /// Build from `[straight, turn, (middle wheel distance in meters, middle scale)]`.
    ///
    /// The middle pair is all-or-nothing: exactly three values is rejected.
    pub fn from_ratios(scales: &[f64], tpr: u32) -> Result<Self> {
        check_inputs(scales.len(), tpr)?;
        if scales.len() == 3 {
            return Err(invalid_config(
                "ChassisScales: middle wheel distance and scale must both be supplied, not just one",
            ));
        }

        let straight = positive_ratio("straight", scales[0])?;
        let turn = scales[1];
        let middle = match scales.get(3) {
            Some(&m) => positive_ratio("middle", m)?,
            None => straight,
        };
        let middle_wheel_distance = match scales.get(2) {
            Some(&m) if scales.len() >= 4 => m * METER,
            _ => QLength::ZERO,
        };

        let tpr_f = f64::from(tpr);
        let wheel_diameter = (tpr_f / (straight * PI)) * METER;
        Ok(Self {
            tpr,
            wheel_diameter,
            track_width: wheel_diameter * turn,
            middle_wheel_distance,
            middle_wheel_diameter: (tpr_f / (middle * PI)) * METER,
            straight,
            turn,
            middle,
        })
    }

    pub fn tpr(&self) -> u32 {
        self.tpr
    }

    pub fn wheel_diameter(&self) -> QLength {
        self.wheel_diameter
    }

    pub fn track_width(&self) -> QLength {
        self.track_width
    }

    pub fn middle_wheel_distance(&self) -> QLength {
        self.middle_wheel_distance
    }

    pub fn middle_wheel_diameter(&self) -> QLength {
        self.middle_wheel_diameter
    }

    pub fn straight(&self) -> f64 {
        self.straight
    }

    pub fn turn(&self) -> f64 {
        self.turn
    }

    pub fn middle(&self) -> f64 {
        self.middle
    }
}

fn check_inputs(len: usize, tpr: u32) -> Result<()> {
    if len < 2 {
        return Err(invalid_config(format!(
            "ChassisScales: at least two measurements must be given, got {len}"
        )));
    }
    if tpr == 0 {
        return Err(invalid_config("ChassisScales: ticks per revolution must be > 0"));
    }
    Ok(())
}

fn positive_meters(what: &str, len: QLength) -> Result<f64> {
    let m = len.convert(METER);
    if m.is_finite() && m > 0.0 {
        Ok(m)
    } else {
        Err(invalid_config(format!("ChassisScales: {what} must be > 0, got {len}")))
    }
}

fn positive_ratio(what: &str, v: f64) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(invalid_config(format!("ChassisScales: {what} scale must be > 0, got {v}")))
    }
}
