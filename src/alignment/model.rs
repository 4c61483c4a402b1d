//! Alignment model: observed (sky, mount) pairs and the fitted correction.

use libm::{exp, floor, sqrt};
use nalgebra::{Matrix3, Vector3};

use super::solver::{
    apply_mechanical_model, euler_from_rotation, fit_parameters, rotation_between,
    rotation_from_euler, weighted_svd_rotation, Parameters, PARAMETER_COUNT,
};
use super::vector::{angle_between, normalized, vector_from_altaz, vector_to_altaz};
use crate::config::AlignmentConfig;

/// Capacity of the alignment point store.
pub const MAX_ALIGNMENT_POINTS: usize = 128;

/// Squared chord distance at which the local bias boost falls to `1/e`.
const LOCAL_SIGMA_SQ: f64 = 0.5;

/// Boost factor applied to the local bias.
const LOCAL_BOOST: f64 = 10.0;

const ARCMIN_PER_RAD: f64 = 180.0 * 60.0 / core::f64::consts::PI;

/// One observed correspondence between a sky direction and the mount's
/// encoder direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentPoint {
    /// Apparent topocentric direction (unit vector).
    pub sky: Vector3<f64>,
    /// Encoder direction the mount reported (unit vector).
    pub mount: Vector3<f64>,
    /// Relative weight, always positive.
    pub weight: f64,
}

impl AlignmentPoint {
    /// Create a point, normalizing both vectors.
    ///
    /// Degenerate vectors become the horizon-north direction and weights
    /// that are not positive and finite become 1.
    pub fn new(sky: Vector3<f64>, mount: Vector3<f64>, weight: f64) -> Self {
        let weight = if weight.is_finite() && weight > 0.0 { weight } else { 1.0 };
        Self {
            sky: normalized(&sky).unwrap_or_else(Vector3::x),
            mount: normalized(&mount).unwrap_or_else(Vector3::x),
            weight,
        }
    }

    /// Create a point from azimuth/altitude pairs in degrees.
    pub fn from_altaz(sky_az: f64, sky_alt: f64, mount_az: f64, mount_alt: f64, weight: f64) -> Self {
        Self::new(
            vector_from_altaz(sky_az, sky_alt),
            vector_from_altaz(mount_az, mount_alt),
            weight,
        )
    }
}

/// Number of fitted parameters in the nonlinear model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FitOrder {
    /// Rotation plus index offset.
    Four,
    /// Rotation plus index offset, cone and non-perpendicularity.
    Six,
}

impl FitOrder {
    /// Number of active parameters.
    #[inline]
    pub const fn len(self) -> usize {
        match self {
            FitOrder::Four => 4,
            FitOrder::Six => 6,
        }
    }
}

/// Which correction is active, chosen from the number of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModelTier {
    /// No points: sky and mount coincide.
    Identity,
    /// One point: exact rotation between its two vectors.
    SinglePointRotation,
    /// Two points: least-squares rotation.
    SvdRotation,
    /// Three or more points: rotation plus mechanical terms.
    ParametricFit(FitOrder),
}

impl ModelTier {
    /// Tier used for a given number of alignment points.
    pub const fn for_point_count(count: usize) -> Self {
        match count {
            0 => ModelTier::Identity,
            1 => ModelTier::SinglePointRotation,
            2 => ModelTier::SvdRotation,
            3..=5 => ModelTier::ParametricFit(FitOrder::Four),
            _ => ModelTier::ParametricFit(FitOrder::Six),
        }
    }
}

/// What [`AlignmentModel::add_point`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointDisposition {
    /// Stored in a free slot.
    Appended,
    /// Stored in place of the worst point at this index.
    Replaced(usize),
    /// Fit the current model worse than every point it competed with.
    Discarded,
}

/// Summary of the fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentStatus {
    /// Number of stored points.
    pub point_count: usize,
    /// Active model tier.
    pub tier: ModelTier,
    /// RMS residual in arcseconds.
    pub rms_arcsec: f64,
    /// Altitude index offset in arcminutes.
    pub index_offset_arcmin: f64,
    /// Cone error in arcminutes.
    pub cone_arcmin: f64,
    /// Axis non-perpendicularity in arcminutes.
    pub nonperpendicularity_arcmin: f64,
}

/// Sky-to-mount correction fitted from alignment points.
///
/// Every insertion or removal refits from scratch, so the model is always
/// a pure function of the stored points.
#[derive(Debug, Clone)]
pub struct AlignmentModel {
    config: AlignmentConfig,
    points: heapless::Vec<AlignmentPoint, MAX_ALIGNMENT_POINTS>,
    matrix: Matrix3<f64>,
    params: Parameters,
    rms_arcsec: f64,
}

impl Default for AlignmentModel {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

impl AlignmentModel {
    /// Create an empty model.
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config,
            points: heapless::Vec::new(),
            matrix: Matrix3::identity(),
            params: [0.0; PARAMETER_COUNT],
            rms_arcsec: 0.0,
        }
    }

    /// Thinning settings.
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Stored points, oldest first.
    pub fn points(&self) -> &[AlignmentPoint] {
        &self.points
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no points are stored.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Base rotation matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// `[roll, pitch, yaw, ID, CH, NP]` in radians.
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// RMS residual of the stored points in arcseconds.
    pub fn rms_arcsec(&self) -> f64 {
        self.rms_arcsec
    }

    /// Active model tier.
    pub fn tier(&self) -> ModelTier {
        ModelTier::for_point_count(self.points.len())
    }

    /// Record an observation.
    ///
    /// Points are bucketed by sky sector. A full sector (or a full store)
    /// keeps whichever of its members and the candidate fit the current
    /// model best, dropping the single worst one; on a tie the stored point
    /// stays.
    pub fn add_point(&mut self, sky: Vector3<f64>, mount: Vector3<f64>, weight: f64) -> PointDisposition {
        let candidate = AlignmentPoint::new(sky, mount, weight);
        let sector = self.sector_of(&candidate.sky);
        let capacity = usize::from(self.config.max_per_sector.max(1));

        let in_sector = self
            .points
            .iter()
            .filter(|p| self.sector_of(&p.sky) == sector)
            .count();

        if in_sector < capacity && !self.points.is_full() {
            // Capacity checked above.
            let _ = self.points.push(candidate);
            self.refit();
            return PointDisposition::Appended;
        }

        let competes_whole_store = in_sector < capacity;
        let worst = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| competes_whole_store || self.sector_of(&p.sky) == sector)
            .map(|(i, p)| (i, self.residual(p)))
            .fold(None, |worst: Option<(usize, f64)>, (i, r)| match worst {
                Some((_, w)) if w >= r => worst,
                _ => Some((i, r)),
            });

        match worst {
            Some((index, r)) if r > self.residual(&candidate) => {
                self.points[index] = candidate;
                self.refit();
                PointDisposition::Replaced(index)
            }
            _ => PointDisposition::Discarded,
        }
    }

    /// Remove the most recently appended point and refit.
    pub fn remove_last(&mut self) -> Option<AlignmentPoint> {
        let removed = self.points.pop();
        if removed.is_some() {
            self.refit();
        }
        removed
    }

    /// Forget every point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.matrix = Matrix3::identity();
        self.params = [0.0; PARAMETER_COUNT];
        self.rms_arcsec = 0.0;
    }

    /// Map a sky direction to the direction the mount encoders should read.
    ///
    /// With fewer than three points and a positive `local_bias`, the
    /// rotation is re-solved with extra weight on points near `target`.
    pub fn transform_to_mount(&self, sky: &Vector3<f64>, target: Option<&Vector3<f64>>, local_bias: f64) -> Vector3<f64> {
        let Some(sky) = normalized(sky) else {
            return *sky;
        };

        match self.tier() {
            ModelTier::ParametricFit(_) => apply_mechanical_model(&sky, &self.params),
            ModelTier::SvdRotation if local_bias > 0.0 => match target.and_then(normalized) {
                Some(target) => self.local_rotation(&target, local_bias) * sky,
                None => self.matrix * sky,
            },
            _ => self.matrix * sky,
        }
    }

    /// Map an encoder direction back to the sky.
    ///
    /// Only the base rotation is inverted; the mechanical terms are not.
    pub fn transform_to_sky(&self, mount: &Vector3<f64>) -> Vector3<f64> {
        match normalized(mount) {
            Some(mount) => self.matrix.transpose() * mount,
            None => *mount,
        }
    }

    /// Point count, tier, RMS and the mechanical terms in arcminutes.
    pub fn status(&self) -> AlignmentStatus {
        AlignmentStatus {
            point_count: self.points.len(),
            tier: self.tier(),
            rms_arcsec: self.rms_arcsec,
            index_offset_arcmin: self.params[3] * ARCMIN_PER_RAD,
            cone_arcmin: self.params[4] * ARCMIN_PER_RAD,
            nonperpendicularity_arcmin: self.params[5] * ARCMIN_PER_RAD,
        }
    }

    fn sector_of(&self, sky: &Vector3<f64>) -> (i32, i32) {
        let (az, alt) = vector_to_altaz(sky);
        let size = self.config.sector_size;
        (floor(az / size) as i32, floor((alt + 90.0) / size) as i32)
    }

    /// Current model prediction for a sky vector.
    fn predict(&self, sky: &Vector3<f64>) -> Vector3<f64> {
        match self.tier() {
            ModelTier::ParametricFit(_) => apply_mechanical_model(sky, &self.params),
            _ => self.matrix * sky,
        }
    }

    fn residual(&self, point: &AlignmentPoint) -> f64 {
        angle_between(&self.predict(&point.sky), &point.mount)
    }

    fn local_rotation(&self, target: &Vector3<f64>, bias: f64) -> Matrix3<f64> {
        weighted_svd_rotation(self.points.iter().map(|p| {
            let d_sq = 2.0 * (1.0 - target.dot(&p.sky));
            let proximity = exp(-d_sq / LOCAL_SIGMA_SQ);
            (p.sky, p.mount, p.weight * (1.0 + LOCAL_BOOST * bias * proximity))
        }))
    }

    fn refit(&mut self) {
        self.params = [0.0; PARAMETER_COUNT];
        self.matrix = match self.points.as_slice() {
            [] => Matrix3::identity(),
            [only] => rotation_between(&only.sky, &only.mount),
            points => weighted_svd_rotation(points.iter().map(|p| (p.sky, p.mount, p.weight))),
        };

        if let ModelTier::ParametricFit(order) = self.tier() {
            let (roll, pitch, yaw) = euler_from_rotation(&self.matrix);
            self.params = fit_parameters(&self.points, [roll, pitch, yaw, 0.0, 0.0, 0.0], order.len());
            self.matrix = rotation_from_euler(self.params[0], self.params[1], self.params[2]);
        }

        self.rms_arcsec = if self.points.is_empty() {
            0.0
        } else {
            let sum_sq: f64 = self
                .points
                .iter()
                .map(|p| {
                    let r = self.residual(p);
                    r * r
                })
                .sum();
            sqrt(sum_sq / self.points.len() as f64).to_degrees() * 3600.0
        };
    }
}
