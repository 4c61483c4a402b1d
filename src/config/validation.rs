//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::units::STEPS_PER_REVOLUTION;
use super::MountConfig;

/// Validate a mount configuration.
///
/// Checks:
/// - Site latitude/longitude are geographic
/// - Slew limits are ordered and in range
/// - Local bias is a percentage
/// - Sector size and capacity are usable
/// - Offsets and backlash fit one revolution
/// - Timing values are positive
pub fn validate_config(config: &MountConfig) -> Result<()> {
    validate_site(config)?;

    if !config.limits.is_valid() {
        let limits = &config.limits;
        let alt_ok = limits.alt_min.0 >= -90.0
            && limits.alt_max.0 <= 90.0
            && limits.alt_min.0 <= limits.alt_max.0;
        return Err(Error::Config(if alt_ok {
            ConfigError::InvalidAzimuthLimits {
                min: limits.az_min.0,
                max: limits.az_max.0,
            }
        } else {
            ConfigError::InvalidAltitudeLimits {
                min: limits.alt_min.0,
                max: limits.alt_max.0,
            }
        }));
    }

    if config.transform.local_bias_percent > 100 {
        return Err(Error::Config(ConfigError::InvalidLocalBias(
            config.transform.local_bias_percent,
        )));
    }

    let sector = config.alignment.sector_size;
    if !(sector > 0.0 && sector <= 90.0) {
        return Err(Error::Config(ConfigError::InvalidSectorSize(sector)));
    }
    if config.alignment.max_per_sector == 0 {
        return Err(Error::Config(ConfigError::InvalidSectorCapacity(0)));
    }

    for offset in [config.approach.azm_offset, config.approach.alt_offset] {
        if offset >= STEPS_PER_REVOLUTION {
            return Err(Error::Config(ConfigError::InvalidApproachOffset(offset)));
        }
    }
    for backlash in [config.backlash.azm, config.backlash.alt] {
        if backlash >= STEPS_PER_REVOLUTION {
            return Err(Error::Config(ConfigError::InvalidBacklash(backlash)));
        }
    }

    validate_timing(config)
}

fn validate_site(config: &MountConfig) -> Result<()> {
    let lat = config.site.latitude.0;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::Config(ConfigError::InvalidLatitude(lat)));
    }

    let lon = config.site.longitude.0;
    if !(-180.0..=360.0).contains(&lon) {
        return Err(Error::Config(ConfigError::InvalidLongitude(lon)));
    }

    Ok(())
}

fn validate_timing(config: &MountConfig) -> Result<()> {
    if config.tracking.interval_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidTiming("tracking interval")));
    }
    if !(config.tracking.delta_t_secs > 0.0) {
        return Err(Error::Config(ConfigError::InvalidTiming("tracking delta_t")));
    }
    if config.transport.timeout_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidTiming("transport timeout")));
    }
    if config.transport.slew_poll_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidTiming("slew poll interval")));
    }
    if config.transport.slew_poll_limit == 0 {
        return Err(Error::Config(ConfigError::InvalidTiming("slew poll limit")));
    }
    Ok(())
}
