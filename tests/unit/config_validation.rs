//! Unit tests for configuration validation.

use aux_mount::config::{parse_config, validate_config, MountConfig};
use aux_mount::error::{ConfigError, Error};

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let toml_str = r#"
[site]
latitude_deg = -33.9
longitude_deg = 18.4

[limits]
alt_min_deg = 0.0
alt_max_deg = 85.0
"#;

    let config: MountConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails for a latitude beyond the pole.
#[test]
fn test_invalid_latitude() {
    let toml_str = r#"
[site]
latitude_deg = 95.0
"#;

    let config: MountConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidLatitude(_)))
    ));
}

/// Test validation fails for an out-of-range azimuth window.
#[test]
fn test_invalid_azimuth_limits() {
    let toml_str = r#"
[limits]
az_min_deg = -10.0
az_max_deg = 370.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAzimuthLimits { .. }))
    ));
}

/// Test that a wrapping azimuth window is accepted.
#[test]
fn test_wrapping_azimuth_window_is_valid() {
    let toml_str = r#"
[limits]
az_min_deg = 300.0
az_max_deg = 60.0
"#;

    assert!(parse_config(toml_str).is_ok());
}

/// Test validation fails for local bias above 100 percent.
#[test]
fn test_invalid_local_bias() {
    let toml_str = r#"
[transform]
local_bias_percent = 150
"#;

    let result = parse_config(toml_str);
    assert_eq!(result, Err(Error::Config(ConfigError::InvalidLocalBias(150))));
}

/// Test validation fails for unusable sector settings.
#[test]
fn test_invalid_sector_settings() {
    let zero_size = parse_config("[alignment]\nsector_size_deg = 0.0\n");
    assert!(matches!(
        zero_size,
        Err(Error::Config(ConfigError::InvalidSectorSize(_)))
    ));

    let zero_capacity = parse_config("[alignment]\nmax_per_sector = 0\n");
    assert_eq!(
        zero_capacity,
        Err(Error::Config(ConfigError::InvalidSectorCapacity(0)))
    );
}

/// Test validation fails for an approach offset of a full revolution.
#[test]
fn test_invalid_approach_offset() {
    let toml_str = r#"
[approach]
mode = "fixed"
azm_offset_steps = 16777216
"#;

    let result = parse_config(toml_str);
    assert_eq!(
        result,
        Err(Error::Config(ConfigError::InvalidApproachOffset(16_777_216)))
    );
}

/// Test validation fails for zero timing values.
#[test]
fn test_invalid_timing() {
    for toml_str in [
        "[tracking]\ninterval_ms = 0\n",
        "[transport]\ntimeout_ms = 0\n",
        "[transport]\nslew_poll_limit = 0\n",
    ] {
        let result = parse_config(toml_str);
        assert!(
            matches!(result, Err(Error::Config(ConfigError::InvalidTiming(_)))),
            "{toml_str} should be rejected"
        );
    }
}
