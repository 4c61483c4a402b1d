//! Slew limit configuration.

use serde::Deserialize;

use super::units::{normalize_degrees, Degrees, Steps};
use crate::error::MotionError;

/// Allowed altitude and azimuth window for GoTo targets.
///
/// The azimuth window wraps through north when `az_min > az_max`, so
/// `az_min = 300, az_max = 60` permits 300..360 and 0..60.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SlewLimits {
    /// Lowest allowed altitude.
    #[serde(rename = "alt_min_deg", default = "default_alt_min")]
    pub alt_min: Degrees,

    /// Highest allowed altitude.
    #[serde(rename = "alt_max_deg", default = "default_alt_max")]
    pub alt_max: Degrees,

    /// Start of the allowed azimuth window.
    #[serde(rename = "az_min_deg", default = "default_az_min")]
    pub az_min: Degrees,

    /// End of the allowed azimuth window.
    #[serde(rename = "az_max_deg", default = "default_az_max")]
    pub az_max: Degrees,
}

fn default_alt_min() -> Degrees {
    Degrees(-90.0)
}

fn default_alt_max() -> Degrees {
    Degrees(90.0)
}

fn default_az_min() -> Degrees {
    Degrees(0.0)
}

fn default_az_max() -> Degrees {
    Degrees(360.0)
}

impl Default for SlewLimits {
    fn default() -> Self {
        Self {
            alt_min: default_alt_min(),
            alt_max: default_alt_max(),
            az_min: default_az_min(),
            az_max: default_az_max(),
        }
    }
}

impl SlewLimits {
    /// Create new slew limits.
    pub fn new(alt_min: Degrees, alt_max: Degrees, az_min: Degrees, az_max: Degrees) -> Self {
        Self {
            alt_min,
            alt_max,
            az_min,
            az_max,
        }
    }

    /// Check if limits are valid.
    pub fn is_valid(&self) -> bool {
        let alt_ok = self.alt_min.0 >= -90.0
            && self.alt_max.0 <= 90.0
            && self.alt_min.0 <= self.alt_max.0;
        let az_ok = (0.0..=360.0).contains(&self.az_min.0) && (0.0..=360.0).contains(&self.az_max.0);
        alt_ok && az_ok
    }

    /// Check whether an altitude is inside the window.
    pub fn contains_altitude(&self, alt: Degrees) -> bool {
        alt.0 >= self.alt_min.0 && alt.0 <= self.alt_max.0
    }

    /// Check whether an azimuth is inside the (possibly wrapping) window.
    pub fn contains_azimuth(&self, az: Degrees) -> bool {
        if self.az_min.0 <= 0.0 && self.az_max.0 >= 360.0 {
            return true;
        }
        let az = normalize_degrees(az.0);
        if self.az_min.0 <= self.az_max.0 {
            az >= self.az_min.0 && az <= self.az_max.0
        } else {
            az >= self.az_min.0 || az <= self.az_max.0
        }
    }

    /// Check a pair of raw encoder positions.
    ///
    /// The altitude encoder is read as a signed angle in `[-180, 180]` so a
    /// position just below the horizon is not mistaken for 359 degrees.
    pub fn check_encoder(&self, azm: u32, alt: u32) -> Result<(), MotionError> {
        let azm_deg = Steps::from_encoder(azm).to_degrees().value();
        let mut alt_deg = Steps::from_encoder(alt).to_degrees().value();
        if alt_deg > 180.0 {
            alt_deg -= 360.0;
        }

        if self.contains_altitude(Degrees(alt_deg)) && self.contains_azimuth(Degrees(azm_deg)) {
            Ok(())
        } else {
            Err(MotionError::LimitViolation { azm_deg, alt_deg })
        }
    }
}
