//! Observer site and coordinate transform settings.

use serde::Deserialize;

use super::units::Degrees;

/// Geographic location of the mount.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ObserverSite {
    /// Geodetic latitude, north positive.
    #[serde(rename = "latitude_deg", default = "default_latitude")]
    pub latitude: Degrees,

    /// Longitude, east positive.
    #[serde(rename = "longitude_deg", default = "default_longitude")]
    pub longitude: Degrees,

    /// Height above sea level in metres.
    #[serde(rename = "elevation_m", default = "default_elevation")]
    pub elevation: f64,
}

fn default_latitude() -> Degrees {
    Degrees(50.1822)
}

fn default_longitude() -> Degrees {
    Degrees(19.7925)
}

fn default_elevation() -> f64 {
    400.0
}

impl Default for ObserverSite {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            elevation: default_elevation(),
        }
    }
}

impl ObserverSite {
    /// Create a site from latitude/longitude in degrees and elevation in metres.
    pub fn new(latitude: Degrees, longitude: Degrees, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

/// Settings consumed by the coordinate transform pipeline.
///
/// Passed explicitly into every transform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct TransformConfig {
    /// Apply atmospheric refraction between true and apparent altitude.
    #[serde(default)]
    pub refraction: bool,

    /// Weight given to alignment points near the target, 0-100.
    ///
    /// Only used while the model has fewer than three points.
    #[serde(rename = "local_bias_percent", default)]
    pub local_bias_percent: u8,
}

impl TransformConfig {
    /// Local bias as a fraction in `[0, 1]`.
    #[inline]
    pub fn local_bias(&self) -> f64 {
        f64::from(self.local_bias_percent.min(100)) / 100.0
    }
}
