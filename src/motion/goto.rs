//! GoTo sequencing states and anti-backlash approach planning.
//!
//! Planning is pure; the async execution lives with the mount facade.

use crate::config::units::STEPS_PER_REVOLUTION;
use crate::config::{ApproachConfig, ApproachMode};
use crate::protocol::CommandCode;

use super::axis::{Axis, AxisRates, Direction, EncoderPosition};

/// Stage of a GoTo sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GotoState {
    /// No GoTo running.
    #[default]
    Idle,
    /// Target being checked against the slew limits.
    LimitCheck,
    /// Target outside the limits; nothing was sent.
    Rejected,
    /// Working out the approach leg.
    ApproachPlanning,
    /// Fast GoTo to the approach point in flight.
    ApproachSlewing,
    /// Waiting for both axes to stop at the approach point.
    ApproachSettling,
    /// GoTo to the target in flight.
    FinalSlewing,
    /// Waiting for both axes to stop at the target.
    Settling,
    /// Both axes stopped at the target.
    Done,
    /// A command failed or the sequence was aborted.
    Alert,
}

impl GotoState {
    /// True for states a sequence ends in.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, GotoState::Idle | GotoState::Rejected | GotoState::Done | GotoState::Alert)
    }

    /// Operation state shown to clients for this stage.
    pub fn operation_state(self) -> OperationState {
        match self {
            GotoState::Idle => OperationState::Idle,
            GotoState::Done => OperationState::Ok,
            GotoState::Rejected | GotoState::Alert => OperationState::Alert,
            _ => OperationState::Busy,
        }
    }
}

/// Client-visible state of the last requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Running.
    Busy,
    /// Completed successfully.
    Ok,
    /// Failed.
    Alert,
}

/// What an equatorial request does once the target is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoordSetMode {
    /// GoTo the target and stop.
    Slew,
    /// GoTo the target, then track it.
    #[default]
    Track,
    /// Treat the current encoder position as the target and add an
    /// alignment point.
    Sync,
}

/// GoTo speed class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlewSpeed {
    /// Full-speed GoTo.
    Fast,
    /// Slow, precise GoTo.
    Slow,
}

impl SlewSpeed {
    /// Motor controller command for this speed.
    #[inline]
    pub fn command(self) -> CommandCode {
        match self {
            SlewSpeed::Fast => CommandCode::MC_GOTO_FAST,
            SlewSpeed::Slow => CommandCode::MC_GOTO_SLOW,
        }
    }
}

/// Planned legs of a GoTo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoPlan {
    /// Intermediate point reached at fast speed first, if any.
    pub approach: Option<EncoderPosition>,
    /// Final target.
    pub target: EncoderPosition,
}

impl GotoPlan {
    /// Plan with no approach leg.
    #[inline]
    pub fn direct(target: EncoderPosition) -> Self {
        Self { approach: None, target }
    }

    /// Speed of the final leg: slow after an approach, fast otherwise.
    #[inline]
    pub fn final_speed(&self) -> SlewSpeed {
        if self.approach.is_some() {
            SlewSpeed::Slow
        } else {
            SlewSpeed::Fast
        }
    }
}

/// Result of a completed GoTo sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoOutcome {
    /// Legs that were executed.
    pub plan: GotoPlan,
    /// State the sequence ended in.
    pub state: GotoState,
}

fn offset_back(target: u32, offset: u32, direction: Direction) -> u32 {
    let rev = i64::from(STEPS_PER_REVOLUTION);
    let signed = match direction {
        Direction::Positive => i64::from(offset),
        Direction::Negative => -i64::from(offset),
    };
    // rem_euclid keeps the result in [0, 2^24)
    (i64::from(target) - signed).rem_euclid(rev) as u32
}

/// Plan the legs of a GoTo to `target`.
///
/// `Fixed` always approaches from below on both axes. `Tracking` approaches
/// along the direction each axis will move while tracking, so the gears are
/// already loaded the right way when tracking starts; without `rates` it
/// behaves like `Fixed`.
pub fn plan_goto(target: EncoderPosition, approach: &ApproachConfig, rates: Option<AxisRates>) -> GotoPlan {
    let direction_of = |axis: Axis| match (approach.mode, rates) {
        (ApproachMode::Tracking, Some(rates)) => Direction::from_signed(rates.get(axis).0),
        _ => Direction::Positive,
    };

    match approach.mode {
        ApproachMode::Disabled => GotoPlan::direct(target),
        ApproachMode::Fixed | ApproachMode::Tracking => GotoPlan {
            approach: Some(EncoderPosition {
                azm: offset_back(target.azm, approach.azm_offset, direction_of(Axis::Azimuth)),
                alt: offset_back(target.alt, approach.alt_offset, direction_of(Axis::Altitude)),
            }),
            target,
        },
    }
}
