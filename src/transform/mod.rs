//! Coordinate transforms between the sky and the mount encoders.

mod oracle;
mod pipeline;
pub mod refraction;

pub use oracle::{
    AstronomicalOracle, Body, Clock, EquatorialCoord, FixedClock, HorizontalCoord, JulianDate, Planet,
    SiderealOracle, Target, TleElements,
};
#[cfg(feature = "std")]
pub use oracle::SystemClock;
pub use pipeline::{wrap_diff, CoordinateTransformPipeline};
