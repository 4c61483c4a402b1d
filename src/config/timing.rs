//! Tracking loop and transport timing settings.

use core::time::Duration;

use serde::Deserialize;

/// Continuous tracking loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrackingConfig {
    /// Period between rate updates.
    #[serde(rename = "interval_ms", default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Half-width of the centered difference used to estimate rates.
    #[serde(rename = "delta_t_secs", default = "default_delta_t")]
    pub delta_t_secs: f64,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_delta_t() -> f64 {
    30.0
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            delta_t_secs: default_delta_t(),
        }
    }
}

impl TrackingConfig {
    /// Period between rate updates.
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Transport deadlines and slew-completion polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Deadline for one command/response round trip.
    #[serde(rename = "timeout_ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay between slew-done polls.
    #[serde(rename = "slew_poll_ms", default = "default_poll_ms")]
    pub slew_poll_ms: u64,

    /// Number of slew-done polls before giving up.
    #[serde(rename = "slew_poll_limit", default = "default_poll_limit")]
    pub slew_poll_limit: u32,
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_poll_ms() -> u64 {
    200
}

fn default_poll_limit() -> u32 {
    600
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            slew_poll_ms: default_poll_ms(),
            slew_poll_limit: default_poll_limit(),
        }
    }
}

impl TransportConfig {
    /// Deadline for one command/response round trip.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay between slew-done polls.
    #[inline]
    pub fn slew_poll_interval(&self) -> Duration {
        Duration::from_millis(self.slew_poll_ms)
    }
}
