//! Mount configuration - root configuration structure.

use serde::Deserialize;

use super::alignment::AlignmentConfig;
use super::limits::SlewLimits;
use super::motion::{ApproachConfig, BacklashConfig};
use super::site::{ObserverSite, TransformConfig};
use super::timing::{TrackingConfig, TransportConfig};

/// Root configuration structure from TOML.
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct MountConfig {
    /// Observer location.
    #[serde(default)]
    pub site: ObserverSite,

    /// Refraction and local-bias settings.
    #[serde(default)]
    pub transform: TransformConfig,

    /// GoTo target window.
    #[serde(default)]
    pub limits: SlewLimits,

    /// Anti-backlash approach.
    #[serde(default)]
    pub approach: ApproachConfig,

    /// Alignment point thinning.
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Continuous tracking loop.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Transport deadlines and slew polling.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Gear play per axis.
    #[serde(default)]
    pub backlash: BacklashConfig,
}
