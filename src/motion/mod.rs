//! Axis state, GoTo planning and rate encoding.

mod axis;
mod goto;
mod rate;

pub use axis::{AxesState, Axis, AxisRates, Direction, EncoderPosition, MountAxisState, StepPosition};
pub use goto::{plan_goto, CoordSetMode, GotoOutcome, GotoPlan, GotoState, OperationState, SlewSpeed};
pub use rate::{GuideRate, SlewRate, GUIDE_RATE_SCALE};
