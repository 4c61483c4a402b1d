//! Anti-backlash approach and backlash bookkeeping settings.

use serde::Deserialize;

/// How the final leg of a GoTo approaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApproachMode {
    /// Slew straight to the target.
    #[default]
    Disabled,
    /// Always finish moving in the positive direction on both axes.
    Fixed,
    /// Finish moving in the direction the target drifts, per axis.
    Tracking,
}

/// Anti-backlash approach configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ApproachConfig {
    /// Approach strategy.
    #[serde(default)]
    pub mode: ApproachMode,

    /// Azimuth distance of the intermediate point, in encoder steps.
    #[serde(rename = "azm_offset_steps", default = "default_offset")]
    pub azm_offset: u32,

    /// Altitude distance of the intermediate point, in encoder steps.
    #[serde(rename = "alt_offset_steps", default = "default_offset")]
    pub alt_offset: u32,
}

fn default_offset() -> u32 {
    10_000
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            mode: ApproachMode::Disabled,
            azm_offset: default_offset(),
            alt_offset: default_offset(),
        }
    }
}

impl ApproachConfig {
    /// Same offsets with a different mode.
    pub fn with_mode(self, mode: ApproachMode) -> Self {
        Self { mode, ..self }
    }
}

/// Measured gear play per axis, in encoder steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BacklashConfig {
    /// Azimuth gear play.
    #[serde(rename = "azm_steps", default)]
    pub azm: u32,

    /// Altitude gear play.
    #[serde(rename = "alt_steps", default)]
    pub alt: u32,
}
