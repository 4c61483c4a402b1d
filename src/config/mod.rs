//! Configuration module for aux-mount.
//!
//! Provides types for loading and validating the mount configuration from
//! TOML files (with `std` feature) or building it in code.

mod alignment;
mod limits;
mod motion;
mod site;
mod system;
mod timing;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use alignment::AlignmentConfig;
pub use limits::SlewLimits;
pub use motion::{ApproachConfig, ApproachMode, BacklashConfig};
pub use site::{ObserverSite, TransformConfig};
pub use system::MountConfig;
pub use timing::{TrackingConfig, TransportConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Degrees, Hours, Steps, StepsPerSec};
