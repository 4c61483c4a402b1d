//! Atmospheric refraction between true and apparent altitude.
//!
//! Uses the Saemundsson cotangent formula, valid from just below the
//! horizon to just short of the zenith; outside that band altitudes pass
//! through unchanged.

use libm::tan;

const MIN_ALTITUDE: f64 = -2.0;
const MAX_ALTITUDE: f64 = 89.9;
const REMOVAL_ITERATIONS: usize = 3;

fn in_band(alt: f64) -> bool {
    (MIN_ALTITUDE..=MAX_ALTITUDE).contains(&alt)
}

/// Refraction in degrees for a true altitude in degrees.
fn refraction(alt: f64) -> f64 {
    let h = alt.max(0.0);
    1.0 / tan((h + 7.31 / (h + 4.4)).to_radians()) / 60.0
}

/// True altitude to apparent (refracted) altitude, both in degrees.
pub fn apply_refraction(alt: f64) -> f64 {
    if in_band(alt) {
        alt + refraction(alt)
    } else {
        alt
    }
}

/// Apparent altitude back to true altitude, by fixed-point iteration.
pub fn remove_refraction(apparent: f64) -> f64 {
    if !in_band(apparent) {
        return apparent;
    }
    let mut alt = apparent;
    for _ in 0..REMOVAL_ITERATIONS {
        alt = apparent - refraction(alt);
    }
    alt
}
