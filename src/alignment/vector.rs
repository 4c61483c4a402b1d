//! Direction-cosine helpers shared by the alignment model and the pipeline.
//!
//! Horizon convention: `x = cos(alt)·cos(az)`, `y = cos(alt)·sin(az)`,
//! `z = sin(alt)`, azimuth measured from north through east.

use libm::{atan2, cos, fabs, sin, sqrt};
use nalgebra::Vector3;

use crate::config::units::normalize_degrees;

/// Inputs shorter than this are treated as degenerate.
pub const DEGENERATE_NORM: f64 = 1e-9;

/// Unit vector for an azimuth/altitude pair in degrees.
pub fn vector_from_altaz(az: f64, alt: f64) -> Vector3<f64> {
    let az = az.to_radians();
    let alt = alt.to_radians();
    Vector3::new(cos(alt) * cos(az), cos(alt) * sin(az), sin(alt))
}

/// Azimuth in `[0, 360)` and altitude in `[-90, 90]` of a vector.
///
/// The vector need not be normalized. A degenerate vector maps to `(0, 0)`.
pub fn vector_to_altaz(v: &Vector3<f64>) -> (f64, f64) {
    let horizontal = sqrt(v.x * v.x + v.y * v.y);
    if horizontal + fabs(v.z) < DEGENERATE_NORM {
        return (0.0, 0.0);
    }
    let alt = atan2(v.z, horizontal).to_degrees();
    let az = normalize_degrees(atan2(v.y, v.x).to_degrees());
    (az, alt)
}

/// Unit vector for right ascension (hours) and declination (degrees).
pub fn vector_from_radec(ra_hours: f64, dec: f64) -> Vector3<f64> {
    vector_from_altaz(ra_hours * 15.0, dec)
}

/// Right ascension in `[0, 24)` hours and declination in degrees.
pub fn vector_to_radec(v: &Vector3<f64>) -> (f64, f64) {
    let (lon, lat) = vector_to_altaz(v);
    (lon / 15.0, lat)
}

/// Normalize, or `None` when the vector is too short to have a direction.
pub fn normalized(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if norm < DEGENERATE_NORM || !norm.is_finite() {
        None
    } else {
        Some(v / norm)
    }
}

/// Great-circle angle between two unit vectors in radians.
///
/// `atan2(|a×b|, a·b)` equals `acos(a·b)` for unit vectors but stays
/// accurate for nearly parallel and nearly antiparallel pairs.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    atan2(a.cross(b).norm(), a.dot(b))
}
