//! Alignment and calibration engine.
//!
//! Fits the correction between where the sky says a star is and where the
//! mount encoders read it, choosing the model from the number of points:
//!
//! | Points | Model |
//! |---|---|
//! | 0 | identity |
//! | 1 | exact rotation between the pair |
//! | 2 | weighted least-squares rotation (SVD) |
//! | 3-5 | rotation + index offset |
//! | 6+ | rotation + index offset, cone error, non-perpendicularity |

mod model;
pub mod solver;
pub mod vector;

pub use model::{
    AlignmentModel, AlignmentPoint, AlignmentStatus, FitOrder, ModelTier, PointDisposition,
    MAX_ALIGNMENT_POINTS,
};
pub use solver::Parameters;
pub use vector::{angle_between, vector_from_altaz, vector_from_radec, vector_to_altaz, vector_to_radec};

pub use nalgebra::Vector3;
