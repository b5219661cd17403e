//! Unit-safe wrappers for the quantities of the DC network model.
//!
//! The DC model in this workspace is expressed in engineering units rather
//! than per-unit: flows in MW, angles in degrees, reactance in deg/MW and
//! susceptance in MW/deg. Newtypes keep those from being mixed by accident.
//!
//! ```
//! use scopf_core::units::{Degrees, DegreesPerMw, Megawatts};
//!
//! let x = DegreesPerMw(0.1);
//! let flow: Megawatts = x.recip() * Degrees(5.0);
//! assert!((flow.value() - 50.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Voltage angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "deg");

/// Series reactance of a branch, expressed as angle drop per MW of flow.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct DegreesPerMw(pub f64);

impl_unit_ops!(DegreesPerMw, "deg/MW");

impl DegreesPerMw {
    /// Susceptance `1/x`. Callers must have rejected `x == 0` beforehand.
    #[inline]
    pub fn recip(self) -> MwPerDegree {
        MwPerDegree(1.0 / self.0)
    }
}

/// Branch susceptance, MW of flow per degree of angle difference.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MwPerDegree(pub f64);

impl_unit_ops!(MwPerDegree, "MW/deg");

impl Mul<Degrees> for MwPerDegree {
    type Output = Megawatts;
    fn mul(self, rhs: Degrees) -> Megawatts {
        Megawatts(self.0 * rhs.0)
    }
}
