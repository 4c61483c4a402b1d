//! Equatorial ⇄ horizon ⇄ encoder step conversions.

use libm::fmod;

use super::oracle::{AstronomicalOracle, EquatorialCoord, HorizontalCoord, JulianDate, Target};
use super::refraction::{apply_refraction, remove_refraction};
use crate::alignment::{vector_from_altaz, vector_to_altaz, AlignmentModel};
use crate::config::units::{Degrees, Steps, StepsPerSec, STEPS_PER_REVOLUTION};
use crate::config::{ObserverSite, TransformConfig};
use crate::motion::{AxisRates, StepPosition};

/// Signed shortest step distance from `a` to `b` on the encoder circle,
/// in `(-2^23, 2^23]`.
pub fn wrap_diff(b: f64, a: f64) -> f64 {
    let rev = f64::from(STEPS_PER_REVOLUTION);
    let half = rev / 2.0;
    let d = fmod(b - a, rev);
    if d > half {
        d - rev
    } else if d <= -half {
        d + rev
    } else {
        d
    }
}

/// Converts between celestial coordinates and encoder steps through the
/// oracle, refraction and the alignment model.
///
/// Borrows its configuration so every call sees exactly the settings it
/// was built with.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransformPipeline<'a, O: ?Sized> {
    oracle: &'a O,
    site: &'a ObserverSite,
    config: &'a TransformConfig,
}

impl<'a, O> CoordinateTransformPipeline<'a, O>
where
    O: AstronomicalOracle + ?Sized,
{
    /// Create a pipeline over an oracle, site and transform settings.
    pub fn new(oracle: &'a O, site: &'a ObserverSite, config: &'a TransformConfig) -> Self {
        Self { oracle, site, config }
    }

    /// Where the sky shows an equatorial position at `at`, including
    /// refraction when enabled.
    pub fn sky_position(&self, position: EquatorialCoord, at: JulianDate) -> HorizontalCoord {
        let mut horizontal = self.oracle.apparent_altaz(position, self.site, at);
        if self.config.refraction {
            horizontal.alt = Degrees(apply_refraction(horizontal.alt.0));
        }
        horizontal
    }

    /// Encoder steps for a sky azimuth/altitude.
    pub fn horizontal_to_steps(&self, model: &AlignmentModel, sky: HorizontalCoord) -> StepPosition {
        let sky = vector_from_altaz(sky.az.0, sky.alt.0);
        let mount = model.transform_to_mount(&sky, Some(&sky), self.config.local_bias());
        let (az, alt) = vector_to_altaz(&mount);
        StepPosition {
            azm: Steps::from_degrees(Degrees(az)),
            alt: Steps::from_degrees(Degrees(alt)),
        }
    }

    /// Unrounded encoder steps for an equatorial position at `at`.
    pub fn equatorial_to_steps(&self, model: &AlignmentModel, position: EquatorialCoord, at: JulianDate) -> StepPosition {
        self.horizontal_to_steps(model, self.sky_position(position, at))
    }

    /// Sky azimuth/altitude (refraction removed when enabled) for encoder steps.
    pub fn steps_to_horizontal(&self, model: &AlignmentModel, steps: StepPosition) -> HorizontalCoord {
        let mount = vector_from_altaz(steps.azm.to_degrees().0, steps.alt.to_degrees().0);
        let (az, alt) = vector_to_altaz(&model.transform_to_sky(&mount));
        let alt = if self.config.refraction {
            remove_refraction(alt)
        } else {
            alt
        };
        HorizontalCoord::new(Degrees(az), Degrees(alt))
    }

    /// Equatorial position for encoder steps at `at`.
    ///
    /// Approximate: the mechanical terms of the model are not inverted.
    pub fn steps_to_equatorial(&self, model: &AlignmentModel, steps: StepPosition, at: JulianDate) -> EquatorialCoord {
        self.oracle.equatorial_of(self.steps_to_horizontal(model, steps), self.site, at)
    }

    /// Per-axis rates that keep `target` centred, from a centered difference
    /// over `at ± delta_t` seconds.
    ///
    /// Each side resolves the target on its own; an unresolvable body uses
    /// `fallback`.
    pub fn tracking_rates(
        &self,
        model: &AlignmentModel,
        target: &Target,
        fallback: EquatorialCoord,
        at: JulianDate,
        delta_t: f64,
    ) -> AxisRates {
        let steps_at = |when: JulianDate| {
            let position = target.resolve(self.oracle, self.site, when).unwrap_or(fallback);
            self.equatorial_to_steps(model, position, when)
        };

        let ahead = steps_at(at.offset_seconds(delta_t));
        let behind = steps_at(at.offset_seconds(-delta_t));
        let span = 2.0 * delta_t;

        AxisRates {
            azm: StepsPerSec(wrap_diff(ahead.azm.0, behind.azm.0) / span),
            alt: StepsPerSec(wrap_diff(ahead.alt.0, behind.alt.0) / span),
        }
    }
}
