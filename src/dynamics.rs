//! Free-flight laws.
//!
//! Newtonian motion leaves contact radii fixed, so shell crossings reduce to
//! the quadratic in `math`. Under compression every interaction radius grows
//! multiplicatively, `r_eff(t) = r * (1 + gamma * t)`, which preserves the
//! ratios between core and shell radii while the packing fraction rises.

use crate::math::{self, Vec3};

const NEWTON_MAX_ITER: usize = 64;
const NEWTON_TOL: f64 = 1e-14;

/// The law governing particle motion between events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dynamics {
    Newtonian,
    /// Diameters grow at fractional rate `growth_rate` per unit time.
    Compression { growth_rate: f64 },
}

impl Dynamics {
    /// Effective contact radius for a nominal radius at absolute time `t`.
    #[inline]
    pub fn radius_at(&self, radius: f64, t: f64) -> f64 {
        match *self {
            Dynamics::Newtonian => radius,
            Dynamics::Compression { growth_rate } => radius * (1.0 + growth_rate * t),
        }
    }

    /// Growth speed of the effective radius (constant in time).
    #[inline]
    pub fn radius_rate(&self, radius: f64) -> f64 {
        match *self {
            Dynamics::Newtonian => 0.0,
            Dynamics::Compression { growth_rate } => radius * growth_rate,
        }
    }

    /// Earliest `t > 0` at which `|dr + dv t|` shrinks to the effective
    /// radius, for a pair currently outside it. `None` if the pair never
    /// reaches the shell (miss, recession, or grazing contact).
    pub fn time_to_contact_in(&self, dr: &Vec3, dv: &Vec3, radius: f64, now: f64) -> Option<f64> {
        let a = math::norm2(dv);
        let b = math::dot(dr, dv);
        match *self {
            Dynamics::Newtonian => {
                let c = math::norm2(dr) - radius * radius;
                math::sphere_in_root(a, b, c)
            }
            Dynamics::Compression { .. } => {
                // Growing shell: the quadratic gains growth terms. Solve by
                // Newton from t = 0, which walks monotonically up to the
                // lowest positive root once existence is established.
                let r0 = self.radius_at(radius, now);
                let g = self.radius_rate(radius);
                let qa = a - g * g;
                let qb = b - r0 * g;
                let qc = math::norm2(dr) - r0 * r0;
                if qb >= 0.0 || qc < 0.0 {
                    return None;
                }
                if qb * qb - qa * qc < 0.0 {
                    return None;
                }
                newton_root(qa, qb, qc)
            }
        }
    }

    /// Earliest `t > 0` at which `|dr + dv t|` reaches the effective radius
    /// from inside.
    pub fn time_to_contact_out(&self, dr: &Vec3, dv: &Vec3, radius: f64, now: f64) -> Option<f64> {
        let a = math::norm2(dv);
        let b = math::dot(dr, dv);
        match *self {
            Dynamics::Newtonian => {
                let c = math::norm2(dr) - radius * radius;
                math::sphere_out_root(a, b, c)
            }
            Dynamics::Compression { .. } => {
                let r0 = self.radius_at(radius, now);
                let g = self.radius_rate(radius);
                let qa = a - g * g;
                let qb = b - r0 * g;
                let qc = math::norm2(dr) - r0 * r0;
                smallest_positive_root(qa, qb, qc)
            }
        }
    }
}

/// Newton iteration on `qa t^2 + 2 qb t + qc` from `t = 0`. Requires
/// `qc > 0`, `qb < 0` and a real root; converges from below in a handful of
/// steps.
fn newton_root(qa: f64, qb: f64, qc: f64) -> Option<f64> {
    let mut t = 0.0;
    for _ in 0..NEWTON_MAX_ITER {
        let f = (qa * t + 2.0 * qb) * t + qc;
        let df = 2.0 * (qa * t + qb);
        if df >= 0.0 {
            // Walked past the vertex without crossing: no approach root.
            return None;
        }
        let step = f / df;
        t -= step;
        if step.abs() <= NEWTON_TOL * t.abs().max(1.0) {
            return (t > 0.0 && t.is_finite()).then_some(t);
        }
    }
    (t > 0.0 && t.is_finite()).then_some(t)
}

/// Smallest strictly positive root of `qa t^2 + 2 qb t + qc`, handling the
/// degenerate linear case (growth speed matching the relative speed).
fn smallest_positive_root(qa: f64, qb: f64, qc: f64) -> Option<f64> {
    if qa.abs() < 1e-300 {
        if qb <= 0.0 {
            return None;
        }
        let t = -qc / (2.0 * qb);
        return (t > 0.0 && t.is_finite()).then_some(t);
    }
    let disc = qb * qb - qa * qc;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let (t1, t2) = ((-qb - sq) / qa, (-qb + sq) / qa);
    let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
    if lo > 0.0 && lo.is_finite() {
        Some(lo)
    } else if hi > 0.0 && hi.is_finite() {
        Some(hi)
    } else {
        None
    }
}
