//! Manual slew rates and guide-rate encoding.

use libm::{fabs, round};

use crate::config::units::{StepsPerSec, MAX_ENCODER_VALUE, STEPS_PER_REVOLUTION};
use crate::error::MotionError;
use crate::protocol::{pack_int3_steps, CommandCode};

use super::axis::Direction;

/// Guide-rate units (1/1024 arcsec/s) per step/s.
pub const GUIDE_RATE_SCALE: f64 = 360.0 * 3600.0 * 1024.0 / STEPS_PER_REVOLUTION as f64;

/// Hand-controller style rate index for `MC_MOVE_POS`/`MC_MOVE_NEG`.
///
/// 0 stops the axis, 9 is the fastest slew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlewRate(u8);

impl SlewRate {
    /// Stop.
    pub const STOP: Self = Self(0);
    /// Fastest rate.
    pub const MAX: Self = Self(9);

    /// Create a validated rate.
    pub fn new(rate: u8) -> Result<Self, MotionError> {
        if rate <= Self::MAX.0 {
            Ok(Self(rate))
        } else {
            Err(MotionError::InvalidSlewRate(rate))
        }
    }

    /// Raw rate index.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Move command for a direction.
    #[inline]
    pub fn command(direction: Direction) -> CommandCode {
        match direction {
            Direction::Positive => CommandCode::MC_MOVE_POS,
            Direction::Negative => CommandCode::MC_MOVE_NEG,
        }
    }
}

impl TryFrom<u8> for SlewRate {
    type Error = MotionError;

    fn try_from(rate: u8) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

/// A signed axis rate encoded for the motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideRate {
    direction: Direction,
    value: u32,
}

impl GuideRate {
    /// Zero rate.
    pub const STOP: Self = Self {
        direction: Direction::Positive,
        value: 0,
    };

    /// Encode a rate in steps per second, rounding and saturating at 24 bits.
    pub fn from_steps_per_sec(rate: StepsPerSec) -> Self {
        let scaled = round(fabs(rate.0) * GUIDE_RATE_SCALE);
        let value = if scaled.is_finite() {
            scaled.min(f64::from(MAX_ENCODER_VALUE)) as u32
        } else {
            MAX_ENCODER_VALUE
        };
        Self {
            direction: Direction::from_signed(rate.0),
            value,
        }
    }

    /// Create from a raw device value, which is treated as positive.
    pub fn from_raw(value: u32) -> Self {
        Self {
            direction: Direction::Positive,
            value: value.min(MAX_ENCODER_VALUE),
        }
    }

    /// Direction of motion.
    #[inline]
    pub fn direction(self) -> Direction {
        self.direction
    }

    /// Magnitude in 1/1024 arcsec/s.
    #[inline]
    pub fn value(self) -> u32 {
        self.value
    }

    /// Magnitude in arcseconds per second.
    #[inline]
    pub fn arcsec_per_sec(self) -> f64 {
        f64::from(self.value) / 1024.0
    }

    /// `MC_SET_POS_GUIDERATE` or `MC_SET_NEG_GUIDERATE`.
    #[inline]
    pub fn command(self) -> CommandCode {
        match self.direction {
            Direction::Positive => CommandCode::MC_SET_POS_GUIDERATE,
            Direction::Negative => CommandCode::MC_SET_NEG_GUIDERATE,
        }
    }

    /// Three-byte big-endian payload.
    #[inline]
    pub fn payload(self) -> [u8; 3] {
        pack_int3_steps(self.value)
    }
}
