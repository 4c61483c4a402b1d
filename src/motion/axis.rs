//! Per-axis identifiers, positions and state.

use core::fmt;

use libm::fabs;

use crate::config::units::{Steps, StepsPerSec};
use crate::protocol::DeviceId;
use crate::transform::wrap_diff;

/// One of the two mount axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Azimuth axis.
    Azimuth,
    /// Altitude axis.
    Altitude,
}

impl Axis {
    /// Both axes, azimuth first.
    pub const ALL: [Axis; 2] = [Axis::Azimuth, Axis::Altitude];

    /// Motor controller that drives this axis.
    #[inline]
    pub fn device(self) -> DeviceId {
        match self {
            Axis::Azimuth => DeviceId::AZM,
            Axis::Altitude => DeviceId::ALT,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Azimuth => f.write_str("AZM"),
            Axis::Altitude => f.write_str("ALT"),
        }
    }
}

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing encoder count.
    Positive,
    /// Decreasing encoder count.
    Negative,
}

impl Direction {
    /// Direction of a signed step delta or rate. Zero counts as positive.
    #[inline]
    pub fn from_signed(value: f64) -> Self {
        if value >= 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Sign multiplier.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Unrounded position of both axes in steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepPosition {
    /// Azimuth steps.
    pub azm: Steps,
    /// Altitude steps.
    pub alt: Steps,
}

impl StepPosition {
    /// Round and wrap both axes for transmission.
    #[inline]
    pub fn to_encoder(self) -> EncoderPosition {
        EncoderPosition {
            azm: self.azm.to_encoder(),
            alt: self.alt.to_encoder(),
        }
    }
}

/// Raw 24-bit encoder values of both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderPosition {
    /// Azimuth encoder.
    pub azm: u32,
    /// Altitude encoder.
    pub alt: u32,
}

impl EncoderPosition {
    /// Create from raw encoder values.
    #[inline]
    pub const fn new(azm: u32, alt: u32) -> Self {
        Self { azm, alt }
    }

    /// Value for one axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Azimuth => self.azm,
            Axis::Altitude => self.alt,
        }
    }

    /// Unrounded view of this position.
    #[inline]
    pub fn to_steps(self) -> StepPosition {
        StepPosition {
            azm: Steps::from_encoder(self.azm),
            alt: Steps::from_encoder(self.alt),
        }
    }
}

/// Signed rates of both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisRates {
    /// Azimuth rate.
    pub azm: StepsPerSec,
    /// Altitude rate.
    pub alt: StepsPerSec,
}

impl AxisRates {
    /// Rate for one axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> StepsPerSec {
        match axis {
            Axis::Azimuth => self.azm,
            Axis::Altitude => self.alt,
        }
    }
}

/// Host-side view of one axis.
///
/// Tracks what was last read from or commanded to the motor controller,
/// plus how much backlash is still to be taken up after a reversal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MountAxisState {
    /// Last known encoder value.
    pub position: u32,
    /// Last commanded GoTo target.
    pub target: u32,
    /// Last commanded rate.
    pub rate: StepsPerSec,
    /// A GoTo is in flight.
    pub slewing: bool,
    /// A non-zero tracking rate is applied.
    pub tracking: bool,
    /// Configured gear backlash in steps.
    pub backlash: u32,
    /// Backlash not yet taken up since the last reversal.
    pub backlash_remaining: u32,
    /// Direction of the last commanded motion.
    pub last_direction: Option<Direction>,
}

impl MountAxisState {
    /// Create an axis state with the given backlash.
    pub fn with_backlash(backlash: u32) -> Self {
        Self {
            backlash,
            ..Self::default()
        }
    }

    /// Record a reversal check for motion in `direction` over `distance` steps.
    fn take_up(&mut self, direction: Direction, distance: f64) {
        if self.last_direction != Some(direction) {
            self.backlash_remaining = self.backlash;
        }
        let distance = libm::round(fabs(distance));
        // distance is below 2^24 after wrap_diff
        self.backlash_remaining = self.backlash_remaining.saturating_sub(distance as u32);
        self.last_direction = Some(direction);
    }

    /// Record a GoTo towards `target`.
    pub fn begin_slew(&mut self, target: u32) {
        let delta = wrap_diff(f64::from(target), f64::from(self.position));
        if delta != 0.0 {
            self.take_up(Direction::from_signed(delta), delta);
        }
        self.target = target;
        self.slewing = true;
    }

    /// Record that the axis reported slew completion at its target.
    pub fn finish_slew(&mut self) {
        self.position = self.target;
        self.slewing = false;
    }

    /// Record an encoder read-back or a position write.
    pub fn set_position(&mut self, position: u32) {
        self.position = position;
        if !self.slewing {
            self.target = position;
        }
    }

    /// Record a commanded rate.
    pub fn set_rate(&mut self, rate: StepsPerSec) {
        if rate.0 != 0.0 {
            self.take_up(Direction::from_signed(rate.0), 0.0);
        }
        self.rate = rate;
        self.tracking = rate.0 != 0.0;
    }

    /// Record a manual move started in `direction`.
    pub fn begin_move(&mut self, direction: Direction) {
        self.take_up(direction, 0.0);
        self.slewing = true;
        self.tracking = false;
    }

    /// Record a full stop.
    pub fn stop(&mut self) {
        self.rate = StepsPerSec(0.0);
        self.slewing = false;
        self.tracking = false;
    }
}

/// Host-side state of both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxesState {
    /// Azimuth axis.
    pub azm: MountAxisState,
    /// Altitude axis.
    pub alt: MountAxisState,
}

impl AxesState {
    /// Create axis states with per-axis backlash.
    pub fn with_backlash(azm: u32, alt: u32) -> Self {
        Self {
            azm: MountAxisState::with_backlash(azm),
            alt: MountAxisState::with_backlash(alt),
        }
    }

    /// State of one axis.
    pub fn axis(&self, axis: Axis) -> &MountAxisState {
        match axis {
            Axis::Azimuth => &self.azm,
            Axis::Altitude => &self.alt,
        }
    }

    /// Mutable state of one axis.
    pub fn axis_mut(&mut self, axis: Axis) -> &mut MountAxisState {
        match axis {
            Axis::Azimuth => &mut self.azm,
            Axis::Altitude => &mut self.alt,
        }
    }

    /// Last known encoder values.
    pub fn position(&self) -> EncoderPosition {
        EncoderPosition::new(self.azm.position, self.alt.position)
    }

    /// True while either axis is slewing.
    pub fn is_slewing(&self) -> bool {
        self.azm.slewing || self.alt.slewing
    }

    /// Stop both axes.
    pub fn stop(&mut self) {
        self.azm.stop();
        self.alt.stop();
    }
}
