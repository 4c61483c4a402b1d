//! Unit types for angles, encoder steps and rates.
//!
//! Provides type-safe representations of the quantities that cross module
//! boundaries so a degree is never mistaken for an hour or a step count.

use core::ops::{Add, Neg, Sub};

use serde::Deserialize;

/// Encoder counts per full axis revolution (24-bit AUX position space).
pub const STEPS_PER_REVOLUTION: u32 = 1 << 24;

/// Largest encoder value that fits the 24-bit wire format.
pub const MAX_ENCODER_VALUE: u32 = STEPS_PER_REVOLUTION - 1;

/// Encoder counts per degree of axis rotation.
pub const STEPS_PER_DEGREE: f64 = STEPS_PER_REVOLUTION as f64 / 360.0;

/// Encoder counts per arcsecond of axis rotation.
pub const STEPS_PER_ARCSEC: f64 = STEPS_PER_DEGREE / 3600.0;

/// Wrap an angle into `[0, 360)`.
#[inline]
pub fn normalize_degrees(value: f64) -> f64 {
    let wrapped = libm::fmod(value, 360.0);
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // -1e-17 + 360.0 rounds to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

impl Degrees {
    /// Create a new Degrees value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to radians.
    #[inline]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Create from radians.
    #[inline]
    pub fn from_radians(radians: f64) -> Self {
        Self(radians.to_degrees())
    }

    /// Wrap into `[0, 360)`.
    #[inline]
    pub fn normalized(self) -> Self {
        Self(normalize_degrees(self.0))
    }

    /// Wrap into `(-180, 180]`.
    #[inline]
    pub fn signed(self) -> Self {
        let d = normalize_degrees(self.0);
        if d > 180.0 {
            Self(d - 360.0)
        } else {
            Self(d)
        }
    }
}

impl Add for Degrees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Degrees {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Degrees {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Right ascension (or hour angle) in hours.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);

impl Hours {
    /// Create a new Hours value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to degrees (15 degrees per hour).
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0 * 15.0)
    }

    /// Create from degrees, wrapped into `[0, 24)`.
    #[inline]
    pub fn from_degrees(degrees: Degrees) -> Self {
        Self(normalize_degrees(degrees.0) / 15.0)
    }
}

/// Axis position in encoder steps.
///
/// Kept as unrounded `f64` while coordinates are being transformed; only
/// [`Steps::to_encoder`] rounds, at the transmission boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Steps(pub f64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Create from an axis angle.
    #[inline]
    pub fn from_degrees(degrees: Degrees) -> Self {
        Self(degrees.0 * STEPS_PER_DEGREE)
    }

    /// Convert to an axis angle (not wrapped).
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0 / STEPS_PER_DEGREE)
    }

    /// Create from a raw encoder value.
    #[inline]
    pub fn from_encoder(value: u32) -> Self {
        Self(f64::from(value & MAX_ENCODER_VALUE))
    }

    /// Round and wrap into the 24-bit encoder space.
    #[inline]
    pub fn to_encoder(self) -> u32 {
        let rev = f64::from(STEPS_PER_REVOLUTION);
        let wrapped = libm::fmod(libm::round(self.0), rev);
        let wrapped = if wrapped < 0.0 { wrapped + rev } else { wrapped };
        (wrapped as u32) & MAX_ENCODER_VALUE
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Axis angular rate in encoder steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct StepsPerSec(pub f64);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to arcseconds per second of axis rotation.
    #[inline]
    pub fn to_arcsec_per_sec(self) -> f64 {
        self.0 / STEPS_PER_ARCSEC
    }
}
