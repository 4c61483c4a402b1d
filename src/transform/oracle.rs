//! Time, targets and the astronomical oracle seam.
//!
//! The crate never computes ephemerides itself. An [`AstronomicalOracle`]
//! converts between equatorial and horizon coordinates for a site and time
//! and may resolve moving bodies; [`SiderealOracle`] is the bundled
//! implementation for fixed RA/Dec targets.

use libm::{asin, atan2, cos, sin};

use crate::config::units::{normalize_degrees, Degrees, Hours};
use crate::config::ObserverSite;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian date of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Instant as a Julian date (UT).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct JulianDate(pub f64);

impl JulianDate {
    /// Create from seconds since the Unix epoch.
    pub fn from_unix_seconds(seconds: f64) -> Self {
        Self(UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY)
    }

    /// Seconds since the Unix epoch.
    pub fn to_unix_seconds(self) -> f64 {
        (self.0 - UNIX_EPOCH_JD) * SECONDS_PER_DAY
    }

    /// The instant `seconds` later (earlier when negative).
    pub fn offset_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds / SECONDS_PER_DAY)
    }

    /// Greenwich mean sidereal time in degrees, `[0, 360)`.
    pub fn gmst(self) -> Degrees {
        let d = self.0 - J2000_JD;
        let t = d / 36_525.0;
        let theta = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0;
        Degrees(normalize_degrees(theta))
    }

    /// Local mean sidereal time for an east-positive longitude.
    pub fn local_sidereal_time(self, longitude: Degrees) -> Degrees {
        Degrees(normalize_degrees(self.gmst().0 + longitude.0))
    }
}

#[cfg(feature = "std")]
impl From<chrono::DateTime<chrono::Utc>> for JulianDate {
    fn from(time: chrono::DateTime<chrono::Utc>) -> Self {
        let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9;
        Self::from_unix_seconds(seconds)
    }
}

/// Source of the current time for transforms and tracking.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> JulianDate;
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub JulianDate);

impl Clock for FixedClock {
    fn now(&self) -> JulianDate {
        self.0
    }
}

/// Wall clock (UTC).
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> JulianDate {
        chrono::Utc::now().into()
    }
}

/// Right ascension / declination of date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EquatorialCoord {
    /// Right ascension.
    pub ra: Hours,
    /// Declination.
    pub dec: Degrees,
}

impl EquatorialCoord {
    /// Create from hours and degrees.
    pub fn new(ra: Hours, dec: Degrees) -> Self {
        Self { ra, dec }
    }
}

/// Azimuth (north through east) and altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HorizontalCoord {
    /// Azimuth.
    pub az: Degrees,
    /// Altitude.
    pub alt: Degrees,
}

impl HorizontalCoord {
    /// Create from degrees.
    pub fn new(az: Degrees, alt: Degrees) -> Self {
        Self { az, alt }
    }
}

/// Major planets the oracle may be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Planet {
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

/// Two-line element set of an artificial satellite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleElements {
    /// Catalogue name.
    pub name: heapless::String<24>,
    /// First element line.
    pub line1: heapless::String<69>,
    /// Second element line.
    pub line2: heapless::String<69>,
}

/// A body whose position changes against the stars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// The Sun.
    Sun,
    /// The Moon.
    Moon,
    /// A major planet.
    Planet(Planet),
    /// An Earth satellite.
    Satellite(TleElements),
}

/// What the mount is asked to point at.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Fixed coordinates of date.
    Sidereal(EquatorialCoord),
    /// Moving body resolved through the oracle.
    Body(Body),
}

impl Target {
    /// Fixed target at the given coordinates.
    pub fn sidereal(ra: Hours, dec: Degrees) -> Self {
        Target::Sidereal(EquatorialCoord::new(ra, dec))
    }

    /// Position of the target at `at`, or `None` when the oracle cannot
    /// resolve the body.
    pub fn resolve<O>(&self, oracle: &O, site: &ObserverSite, at: JulianDate) -> Option<EquatorialCoord>
    where
        O: AstronomicalOracle + ?Sized,
    {
        match self {
            Target::Sidereal(coord) => Some(*coord),
            Target::Body(body) => oracle.body_position(body, site, at),
        }
    }
}

/// Astronomical computations the mount depends on.
pub trait AstronomicalOracle {
    /// Topocentric azimuth/altitude (without refraction) of an equatorial
    /// position.
    fn apparent_altaz(&self, position: EquatorialCoord, site: &ObserverSite, at: JulianDate) -> HorizontalCoord;

    /// Equatorial position of a topocentric azimuth/altitude.
    fn equatorial_of(&self, position: HorizontalCoord, site: &ObserverSite, at: JulianDate) -> EquatorialCoord;

    /// Position of a moving body, if this oracle knows how to compute it.
    fn body_position(&self, body: &Body, site: &ObserverSite, at: JulianDate) -> Option<EquatorialCoord> {
        let _ = (body, site, at);
        None
    }
}

/// Fixed-star oracle driven by local mean sidereal time.
///
/// Ignores precession, nutation and aberration; moving bodies are not
/// resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiderealOracle;

impl AstronomicalOracle for SiderealOracle {
    fn apparent_altaz(&self, position: EquatorialCoord, site: &ObserverSite, at: JulianDate) -> HorizontalCoord {
        let lst = at.local_sidereal_time(site.longitude);
        let ha = (lst.0 - position.ra.to_degrees().0).to_radians();
        let dec = position.dec.to_radians();
        let lat = site.latitude.to_radians();

        let alt = asin(sin(lat) * sin(dec) + cos(lat) * cos(dec) * cos(ha));
        let az = atan2(
            -cos(dec) * sin(ha),
            sin(dec) * cos(lat) - cos(dec) * sin(lat) * cos(ha),
        );

        HorizontalCoord::new(Degrees::from_radians(az).normalized(), Degrees::from_radians(alt))
    }

    fn equatorial_of(&self, position: HorizontalCoord, site: &ObserverSite, at: JulianDate) -> EquatorialCoord {
        let az = position.az.to_radians();
        let alt = position.alt.to_radians();
        let lat = site.latitude.to_radians();

        let dec = asin(sin(lat) * sin(alt) + cos(lat) * cos(alt) * cos(az));
        let ha = atan2(
            -sin(az) * cos(alt),
            sin(alt) * cos(lat) - cos(alt) * sin(lat) * cos(az),
        );

        let lst = at.local_sidereal_time(site.longitude);
        let ra = Degrees(lst.0 - ha.to_degrees());
        EquatorialCoord::new(Hours::from_degrees(ra), Degrees::from_radians(dec))
    }
}
