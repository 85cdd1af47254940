//! Physical quantities for chassis commands.
//!
//! `QLength` is stored in meters and `QAngle` in radians. Values are read back in any
//! unit with `convert`, e.g. `d.convert(INCH)`. The unit constants double as the
//! quantities "one meter", "one degree" and so on, so `2.0 * METER` is a length.
//!
//! ```
//! use tankctl_core::units::{UnitExt, INCH, METER};
//!
//! let d = 4.0.inch();
//! assert!((d.convert(METER) - 0.1016).abs() < 1e-12);
//! assert!((d.convert(INCH) - 4.0).abs() < 1e-12);
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A length, stored in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct QLength(f64);

/// An angle, stored in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct QAngle(f64);

pub const METER: QLength = QLength(1.0);
pub const CENTIMETER: QLength = QLength(0.01);
pub const MILLIMETER: QLength = QLength(0.001);
pub const INCH: QLength = QLength(0.0254);
pub const FOOT: QLength = QLength(0.3048);

pub const RADIAN: QAngle = QAngle(1.0);
pub const DEGREE: QAngle = QAngle(std::f64::consts::PI / 180.0);

macro_rules! quantity_ops {
    ($ty:ident) => {
        impl $ty {
            pub const ZERO: Self = $ty(0.0);

            /// Value expressed in multiples of `unit`.
            #[inline]
            pub fn convert(self, unit: $ty) -> f64 {
                self.0 / unit.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                $ty(self.0.abs())
            }
        }

        impl Add for $ty {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $ty(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $ty(self.0 - rhs.0)
            }
        }

        impl AddAssign for $ty {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $ty {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $ty {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $ty(-self.0)
            }
        }

        impl Mul<f64> for $ty {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $ty(self.0 * rhs)
            }
        }

        impl Mul<$ty> for f64 {
            type Output = $ty;
            #[inline]
            fn mul(self, rhs: $ty) -> $ty {
                $ty(self * rhs.0)
            }
        }

        impl Div<f64> for $ty {
            type Output = Self;
            #[inline]
            fn div(self, rhs: f64) -> Self {
                $ty(self.0 / rhs)
            }
        }

        /// Ratio of two quantities of the same dimension.
        impl Div<$ty> for $ty {
            type Output = f64;
            #[inline]
            fn div(self, rhs: $ty) -> f64 {
                self.0 / rhs.0
            }
        }
    };
}

quantity_ops!(QLength);
quantity_ops!(QAngle);

impl fmt::Display for QLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} m", self.0)
    }
}

impl fmt::Display for QAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} deg", self.convert(DEGREE))
    }
}

/// Literal-style constructors: `1.0.meter()`, `4.0.inch()`, `90.0.deg()`.
pub trait UnitExt {
    fn meter(self) -> QLength;
    fn cm(self) -> QLength;
    fn mm(self) -> QLength;
    fn inch(self) -> QLength;
    fn ft(self) -> QLength;
    fn deg(self) -> QAngle;
    fn rad(self) -> QAngle;
}

impl UnitExt for f64 {
    fn meter(self) -> QLength {
        self * METER
    }
    fn cm(self) -> QLength {
        self * CENTIMETER
    }
    fn mm(self) -> QLength {
        self * MILLIMETER
    }
    fn inch(self) -> QLength {
        self * INCH
    }
    fn ft(self) -> QLength {
        self * FOOT
    }
    fn deg(self) -> QAngle {
        self * DEGREE
    }
    fn rad(self) -> QAngle {
        self * RADIAN
    }
}
