//! Rotation estimators and the mechanical-model fit.
//!
//! Parameters are `[roll, pitch, yaw, ID, CH, NP]` in radians. The base
//! rotation is `Rz(yaw)·Ry(pitch)·Rx(roll)`; the mechanical terms then shift
//! the rotated direction in azimuth (cone, non-perpendicularity) and in
//! altitude (index offset).

use libm::{atan2, cos, fabs, sin, sqrt, tan};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use super::model::AlignmentPoint;
use super::vector::{angle_between, vector_from_altaz, vector_to_altaz};

/// Length of the parameter vector.
pub const PARAMETER_COUNT: usize = 6;

/// `[roll, pitch, yaw, ID, CH, NP]` in radians.
pub type Parameters = [f64; PARAMETER_COUNT];

/// Lower bound on `cos(alt)` in the cone term.
const MIN_COS_ALT: f64 = 0.01;

/// Below this `sqrt(R00² + R10²)` the pitch is treated as ±90°.
const GIMBAL_LOCK: f64 = 1e-6;

const JACOBIAN_STEP: f64 = 1e-7;
const MAX_ITERATIONS: usize = 100;
const MAX_DAMPING: f64 = 1e12;
const COST_FLOOR: f64 = 1e-28;
const STEP_TOLERANCE: f64 = 1e-14;

type Normal = SMatrix<f64, PARAMETER_COUNT, PARAMETER_COUNT>;
type Gradient = SVector<f64, PARAMETER_COUNT>;

/// Rotation `Rz(yaw)·Ry(pitch)·Rx(roll)`.
pub fn rotation_from_euler(roll: f64, pitch: f64, yaw: f64) -> Matrix3<f64> {
    let (sr, cr) = (sin(roll), cos(roll));
    let (sp, cp) = (sin(pitch), cos(pitch));
    let (sy, cy) = (sin(yaw), cos(yaw));

    Matrix3::new(
        cy * cp,
        cy * sp * sr - sy * cr,
        cy * sp * cr + sy * sr,
        sy * cp,
        sy * sp * sr + cy * cr,
        sy * sp * cr - cy * sr,
        -sp,
        cp * sr,
        cp * cr,
    )
}

/// Inverse of [`rotation_from_euler`] as `(roll, pitch, yaw)`.
///
/// At gimbal lock the yaw is pinned to zero and the whole horizontal
/// rotation is attributed to roll.
pub fn euler_from_rotation(m: &Matrix3<f64>) -> (f64, f64, f64) {
    let sy = sqrt(m[(0, 0)] * m[(0, 0)] + m[(1, 0)] * m[(1, 0)]);
    if sy >= GIMBAL_LOCK {
        (
            atan2(m[(2, 1)], m[(2, 2)]),
            atan2(-m[(2, 0)], sy),
            atan2(m[(1, 0)], m[(0, 0)]),
        )
    } else {
        (atan2(-m[(1, 2)], m[(1, 1)]), atan2(-m[(2, 0)], sy), 0.0)
    }
}

fn skew(k: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -k.z, k.y, k.z, 0.0, -k.x, -k.y, k.x, 0.0)
}

/// Smallest rotation taking unit vector `from` onto unit vector `to`.
///
/// Antiparallel inputs give a half turn about an axis orthogonal to `from`.
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> Matrix3<f64> {
    let axis = from.cross(to);
    let s = axis.norm();
    let c = from.dot(to);

    if s < 1e-12 {
        if c > 0.0 {
            return Matrix3::identity();
        }
        // Cross with the basis vector least aligned with `from`.
        let (ax, ay, az) = (fabs(from.x), fabs(from.y), fabs(from.z));
        let basis = if ax <= ay && ax <= az {
            Vector3::x()
        } else if ay <= az {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let k = from.cross(&basis).normalize();
        return 2.0 * k * k.transpose() - Matrix3::identity();
    }

    let k = skew(&(axis / s));
    Matrix3::identity() + k * s + k * k * (1.0 - c)
}

/// Weighted least-squares rotation mapping sky vectors onto mount vectors.
///
/// Weights are normalized to sum to one; non-positive totals fall back to
/// equal weights. The result is always proper (`det = +1`).
pub fn weighted_svd_rotation<I>(pairs: I) -> Matrix3<f64>
where
    I: IntoIterator<Item = (Vector3<f64>, Vector3<f64>, f64)> + Clone,
{
    let (total, count) = pairs
        .clone()
        .into_iter()
        .fold((0.0, 0usize), |(t, n), (_, _, w)| (t + w, n + 1));
    if count == 0 {
        return Matrix3::identity();
    }

    let mut h = Matrix3::zeros();
    for (sky, mount, w) in pairs {
        let w = if total > 0.0 { w / total } else { 1.0 / count as f64 };
        h += mount * sky.transpose() * w;
    }

    let svd = h.svd(true, true);
    let (Some(u), Some(mut v_t)) = (svd.u, svd.v_t) else {
        return Matrix3::identity();
    };

    let r = u * v_t;
    if r.determinant() >= 0.0 {
        return r;
    }
    // Flip the third column of V (third row of Vᵗ).
    for c in 0..3 {
        v_t[(2, c)] = -v_t[(2, c)];
    }
    u * v_t
}

/// Mount direction predicted for `sky` by the full mechanical model.
pub fn apply_mechanical_model(sky: &Vector3<f64>, params: &Parameters) -> Vector3<f64> {
    let rotated = rotation_from_euler(params[0], params[1], params[2]) * sky;
    let (az, alt) = vector_to_altaz(&rotated);

    let alt_rad = alt.to_radians();
    let cos_alt = cos(alt_rad).max(MIN_COS_ALT);
    let d_az = params[4] / cos_alt + params[5] * tan(alt_rad);
    let d_alt = params[3];

    vector_from_altaz(az + d_az.to_degrees(), alt + d_alt.to_degrees())
}

/// Weighted residual as a 3-vector whose length is the weighted angular
/// error. Smooth through zero, unlike the bare angle.
fn residual(point: &AlignmentPoint, params: &Parameters) -> Vector3<f64> {
    let predicted = apply_mechanical_model(&point.sky, params);
    let chord = predicted - point.mount;
    let length = chord.norm();
    let scale = if length > 1e-15 {
        angle_between(&predicted, &point.mount) / length
    } else {
        1.0
    };
    chord * (point.weight * scale)
}

fn cost(points: &[AlignmentPoint], params: &Parameters) -> f64 {
    points.iter().map(|p| residual(p, params).norm_squared()).sum()
}

/// `JᵗJ` and `Jᵗr` with a central-difference Jacobian over the first
/// `active` parameters. Inactive parameters get a unit diagonal and zero
/// gradient so they stay fixed.
fn normal_equations(points: &[AlignmentPoint], params: &Parameters, active: usize) -> (Normal, Gradient) {
    let mut jtj = Normal::zeros();
    let mut jtr = Gradient::zeros();

    for point in points {
        let r = residual(point, params);
        let mut jacobian = SMatrix::<f64, 3, PARAMETER_COUNT>::zeros();
        for k in 0..active {
            let mut plus = *params;
            let mut minus = *params;
            plus[k] += JACOBIAN_STEP;
            minus[k] -= JACOBIAN_STEP;
            let column = (residual(point, &plus) - residual(point, &minus)) / (2.0 * JACOBIAN_STEP);
            jacobian.set_column(k, &column);
        }
        jtj += jacobian.transpose() * jacobian;
        jtr += jacobian.transpose() * r;
    }

    for k in active..PARAMETER_COUNT {
        jtj[(k, k)] = 1.0;
    }
    (jtj, jtr)
}

/// Levenberg-Marquardt over the first `active` parameters (4 or 6),
/// minimizing the sum of squared weighted angular residuals.
pub fn fit_parameters(points: &[AlignmentPoint], initial: Parameters, active: usize) -> Parameters {
    let active = active.min(PARAMETER_COUNT);
    let mut params = initial;
    let mut current = cost(points, &params);
    let mut damping = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        if current < COST_FLOOR {
            break;
        }
        let (jtj, jtr) = normal_equations(points, &params, active);

        let mut accepted = None;
        while damping <= MAX_DAMPING {
            let mut a = jtj;
            for k in 0..PARAMETER_COUNT {
                a[(k, k)] += damping * (1.0 + jtj[(k, k)]);
            }
            let Some(delta) = a.lu().solve(&(-jtr)) else {
                damping *= 10.0;
                continue;
            };

            let mut trial = params;
            for k in 0..active {
                trial[k] += delta[k];
            }
            let trial_cost = cost(points, &trial);
            if trial_cost < current {
                accepted = Some((trial, trial_cost, delta.norm()));
                damping = (damping / 10.0).max(1e-12);
                break;
            }
            damping *= 10.0;
        }

        match accepted {
            Some((trial, trial_cost, step)) => {
                params = trial;
                current = trial_cost;
                if step < STEP_TOLERANCE {
                    break;
                }
            }
            None => break,
        }
    }

    params
}
