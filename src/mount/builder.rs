//! Builder pattern for Mount.

use std::path::Path;

use crate::config::{
    load_config, validate_config, AlignmentConfig, ApproachConfig, BacklashConfig, MountConfig, ObserverSite,
    SlewLimits, TransformConfig,
};
use crate::error::Result;
use crate::transform::{AstronomicalOracle, Clock, SiderealOracle, SystemClock};

use super::controller::Mount;
use super::transport::MountTransport;

/// Builder for creating Mount instances.
///
/// Starts from the default configuration, the bundled [`SiderealOracle`]
/// and the wall clock; each can be replaced before [`build`](Self::build).
pub struct MountBuilder<T, O = SiderealOracle, C = SystemClock> {
    transport: T,
    oracle: O,
    clock: C,
    config: MountConfig,
}

impl<T: MountTransport> MountBuilder<T, SiderealOracle, SystemClock> {
    /// Create a new builder around a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            oracle: SiderealOracle,
            clock: SystemClock,
            config: MountConfig::default(),
        }
    }
}

impl<T, O, C> MountBuilder<T, O, C>
where
    T: MountTransport + 'static,
    O: AstronomicalOracle + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Use a different astronomical oracle.
    pub fn oracle<O2>(self, oracle: O2) -> MountBuilder<T, O2, C> {
        MountBuilder {
            transport: self.transport,
            oracle,
            clock: self.clock,
            config: self.config,
        }
    }

    /// Use a different clock.
    pub fn clock<C2>(self, clock: C2) -> MountBuilder<T, O, C2> {
        MountBuilder {
            transport: self.transport,
            oracle: self.oracle,
            clock,
            config: self.config,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MountConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.config = load_config(path)?;
        Ok(self)
    }

    /// Set the observer site.
    pub fn site(mut self, site: ObserverSite) -> Self {
        self.config.site = site;
        self
    }

    /// Set refraction and local bias.
    pub fn transform(mut self, transform: TransformConfig) -> Self {
        self.config.transform = transform;
        self
    }

    /// Set the slew limits.
    pub fn limits(mut self, limits: SlewLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Set the anti-backlash approach.
    pub fn approach(mut self, approach: ApproachConfig) -> Self {
        self.config.approach = approach;
        self
    }

    /// Set alignment point thinning.
    pub fn alignment(mut self, alignment: AlignmentConfig) -> Self {
        self.config.alignment = alignment;
        self
    }

    /// Set gear backlash per axis.
    pub fn backlash(mut self, backlash: BacklashConfig) -> Self {
        self.config.backlash = backlash;
        self
    }

    /// Build the Mount.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn build(self) -> Result<Mount<T, O, C>> {
        validate_config(&self.config)?;
        Ok(Mount::from_parts(self.transport, self.oracle, self.clock, self.config))
    }
}
