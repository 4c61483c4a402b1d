//! Unit tests for TOML configuration parsing.

use aux_mount::config::{parse_config, ApproachMode, MountConfig};

/// Test parsing a complete mount configuration from TOML.
#[test]
fn test_parse_full_config() {
    let toml_str = r#"
[site]
latitude_deg = 50.1822
longitude_deg = 19.7925
elevation_m = 400.0

[transform]
refraction = true
local_bias_percent = 40

[limits]
alt_min_deg = -5.0
alt_max_deg = 88.0
az_min_deg = 300.0
az_max_deg = 60.0

[approach]
mode = "tracking"
azm_offset_steps = 8000
alt_offset_steps = 6000

[alignment]
sector_size_deg = 20.0
max_per_sector = 3

[tracking]
interval_ms = 500
delta_t_secs = 15.0

[transport]
timeout_ms = 2000
slew_poll_ms = 100
slew_poll_limit = 300

[backlash]
azm_steps = 1200
alt_steps = 900
"#;

    let config: MountConfig = toml::from_str(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.site.latitude.0, 50.1822);
    assert_eq!(config.site.elevation, 400.0);
    assert!(config.transform.refraction);
    assert_eq!(config.transform.local_bias_percent, 40);
    assert_eq!(config.limits.az_min.0, 300.0);
    assert_eq!(config.approach.mode, ApproachMode::Tracking);
    assert_eq!(config.approach.azm_offset, 8000);
    assert_eq!(config.alignment.max_per_sector, 3);
    assert_eq!(config.tracking.interval_ms, 500);
    assert_eq!(config.tracking.delta_t_secs, 15.0);
    assert_eq!(config.transport.slew_poll_limit, 300);
    assert_eq!(config.backlash.alt, 900);
}

/// Test that missing sections take their defaults.
#[test]
fn test_missing_sections_use_defaults() {
    let toml_str = r#"
[approach]
mode = "fixed"
"#;

    let config = parse_config(toml_str).expect("Failed to parse config");

    assert_eq!(config.approach.mode, ApproachMode::Fixed);
    assert_eq!(config.approach.azm_offset, 10_000);
    assert_eq!(config.limits, MountConfig::default().limits);
    assert_eq!(config.tracking.delta_t_secs, 30.0);
    assert_eq!(config.transport.timeout_ms, 1000);
}

/// Test that unknown approach modes are rejected during parsing.
#[test]
fn test_unknown_approach_mode_rejected() {
    let toml_str = r#"
[approach]
mode = "sideways"
"#;

    let result: Result<MountConfig, _> = toml::from_str(toml_str);
    assert!(result.is_err(), "Should reject unknown approach mode");
}

/// Test that parse errors surface as configuration errors.
#[test]
fn test_malformed_toml_is_config_error() {
    let result = parse_config("[site\nlatitude_deg = ");

    assert!(matches!(
        result,
        Err(aux_mount::Error::Config(aux_mount::error::ConfigError::ParseError(_)))
    ));
}
