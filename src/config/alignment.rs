//! Alignment point thinning settings.

use serde::Deserialize;

/// Controls how alignment points are spread over the sky.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AlignmentConfig {
    /// Angular size of one sky sector in degrees.
    #[serde(rename = "sector_size_deg", default = "default_sector_size")]
    pub sector_size: f64,

    /// Points kept per sector before the worst is evicted.
    #[serde(rename = "max_per_sector", default = "default_max_per_sector")]
    pub max_per_sector: u8,
}

fn default_sector_size() -> f64 {
    15.0
}

fn default_max_per_sector() -> u8 {
    2
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            sector_size: default_sector_size(),
            max_per_sector: default_max_per_sector(),
        }
    }
}
